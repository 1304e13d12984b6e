// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Comment forest built from a flat, arbitrarily ordered comment list.
//!
//! Construction pre-indexes children by parent id, so a child listed before
//! its parent still resolves. Traversal starts at root comments only:
//! - a comment whose parent never appears is never reached (hidden, not an error)
//! - a comment naming itself as parent is treated the same way
//! - cycles among non-root comments are unreachable
//! - a repeated id is rendered once

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use bitloss_core::{Comment, CommentId};
use chrono::{DateTime, Utc};

/// One visible comment and its nesting depth (0 for roots).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreadEntry<'a> {
    pub comment: &'a Comment,
    pub depth: usize,
}

/// Index over a borrowed comment list.
#[derive(Debug)]
pub struct CommentTree<'a> {
    comments: &'a [Comment],
    roots: Vec<usize>,
    children: HashMap<&'a str, Vec<usize>>,
}

impl<'a> CommentTree<'a> {
    /// Indexes `comments` by parent id. Sibling order follows input order.
    pub fn build(comments: &'a [Comment]) -> Self {
        let mut roots = Vec::new();
        let mut children: HashMap<&'a str, Vec<usize>> = HashMap::new();

        for (idx, comment) in comments.iter().enumerate() {
            match &comment.parent_id {
                None => roots.push(idx),
                Some(parent) if parent == &comment.id => {}
                Some(parent) => children.entry(parent.as_str()).or_default().push(idx),
            }
        }

        Self {
            comments,
            roots,
            children,
        }
    }

    pub fn roots(&self) -> impl Iterator<Item = &'a Comment> + '_ {
        let comments = self.comments;
        self.roots.iter().map(move |&i| &comments[i])
    }

    /// Direct children of `id`, in input order.
    pub fn children_of(&self, id: &CommentId) -> impl Iterator<Item = &'a Comment> + '_ {
        let comments = self.comments;
        self.children
            .get(id.as_str())
            .into_iter()
            .flatten()
            .map(move |&i| &comments[i])
    }

    /// Depth-first, pre-order walk of every comment reachable from a root.
    pub fn flatten(&self) -> Vec<ThreadEntry<'a>> {
        self.walk().0
    }

    /// Comments that are not reachable from any root.
    pub fn hidden(&self) -> Vec<&'a Comment> {
        let (_, seen) = self.walk();
        self.comments
            .iter()
            .filter(|c| !seen.contains(c.id.as_str()))
            .collect()
    }

    pub fn visible_count(&self) -> usize {
        self.flatten().len()
    }

    fn walk(&self) -> (Vec<ThreadEntry<'a>>, HashSet<&'a str>) {
        let mut out = Vec::with_capacity(self.comments.len());
        let mut seen: HashSet<&'a str> = HashSet::new();
        let mut stack: Vec<(usize, usize)> = self.roots.iter().rev().map(|&i| (i, 0)).collect();

        let comments = self.comments;
        while let Some((idx, depth)) = stack.pop() {
            let comment = &comments[idx];
            if !seen.insert(comment.id.as_str()) {
                continue;
            }
            out.push(ThreadEntry { comment, depth });

            if let Some(kids) = self.children.get(comment.id.as_str()) {
                stack.extend(kids.iter().rev().map(|&k| (k, depth + 1)));
            }
        }

        (out, seen)
    }
}

/// Relative age label for a comment timestamp.
pub fn age_label(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    if created_at == DateTime::UNIX_EPOCH {
        return "just now".to_string();
    }
    let secs = (now - created_at).num_seconds();
    match secs {
        s if s < 60 => "just now".to_string(),
        s if s < 3_600 => format!("{}m ago", s / 60),
        s if s < 86_400 => format!("{}h ago", s / 3_600),
        s => format!("{}d ago", s / 86_400),
    }
}

/// Renders the visible forest as indented text, two spaces per level.
pub fn render_text(comments: &[Comment], now: DateTime<Utc>) -> String {
    let tree = CommentTree::build(comments);
    let mut out = String::new();
    for entry in tree.flatten() {
        let c = entry.comment;
        let marker = if c.is_provisional() { " (sending)" } else { "" };
        let _ = writeln!(
            out,
            "{:indent$}{} [{}]{}: {}",
            "",
            c.username,
            age_label(c.created_at, now),
            marker,
            c.content,
            indent = entry.depth * 2
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn comment(id: &str, parent: Option<&str>) -> Comment {
        Comment {
            id: CommentId::from(id),
            parent_id: parent.map(CommentId::from),
            username: "user".into(),
            content: format!("body {id}"),
            created_at: Utc::now(),
        }
    }

    fn ids(entries: &[ThreadEntry<'_>]) -> Vec<(String, usize)> {
        entries
            .iter()
            .map(|e| (e.comment.id.to_string(), e.depth))
            .collect()
    }

    #[test]
    fn orphan_is_hidden_without_error() {
        let comments = vec![comment("a", None), comment("b", Some("missing"))];
        let tree = CommentTree::build(&comments);
        assert_eq!(ids(&tree.flatten()), vec![("a".to_string(), 0)]);
        assert_eq!(tree.hidden().len(), 1);
        assert_eq!(tree.hidden()[0].id.as_str(), "b");
    }

    #[test]
    fn child_before_parent_still_resolves() {
        let comments = vec![
            comment("c", Some("b")),
            comment("b", Some("a")),
            comment("a", None),
        ];
        let tree = CommentTree::build(&comments);
        assert_eq!(
            ids(&tree.flatten()),
            vec![
                ("a".to_string(), 0),
                ("b".to_string(), 1),
                ("c".to_string(), 2)
            ]
        );
    }

    #[test]
    fn preorder_keeps_sibling_input_order() {
        let comments = vec![
            comment("r1", None),
            comment("r2", None),
            comment("r1a", Some("r1")),
            comment("r1b", Some("r1")),
            comment("r2a", Some("r2")),
        ];
        let tree = CommentTree::build(&comments);
        let order: Vec<String> = tree.flatten().iter().map(|e| e.comment.id.to_string()).collect();
        assert_eq!(order, vec!["r1", "r1a", "r1b", "r2", "r2a"]);
        assert_eq!(tree.roots().count(), 2);
        assert_eq!(tree.children_of(&CommentId::from("r1")).count(), 2);
    }

    #[test]
    fn self_parent_is_hidden() {
        let comments = vec![comment("a", None), comment("s", Some("s"))];
        let tree = CommentTree::build(&comments);
        assert_eq!(tree.visible_count(), 1);
    }

    #[test]
    fn cycle_without_root_is_hidden() {
        let comments = vec![comment("x", Some("y")), comment("y", Some("x"))];
        let tree = CommentTree::build(&comments);
        assert!(tree.flatten().is_empty());
        assert_eq!(tree.hidden().len(), 2);
    }

    #[test]
    fn duplicate_ids_render_once() {
        let comments = vec![comment("a", None), comment("a", None), comment("b", Some("a"))];
        let tree = CommentTree::build(&comments);
        assert_eq!(
            ids(&tree.flatten()),
            vec![("a".to_string(), 0), ("b".to_string(), 1)]
        );
    }

    #[test]
    fn age_labels() {
        let now = Utc::now();
        assert_eq!(age_label(now - Duration::seconds(5), now), "just now");
        assert_eq!(age_label(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(age_label(now - Duration::hours(3), now), "3h ago");
        assert_eq!(age_label(now - Duration::days(2), now), "2d ago");
        assert_eq!(age_label(DateTime::UNIX_EPOCH, now), "just now");
    }

    #[test]
    fn render_indents_replies() {
        let mut comments = vec![comment("a", None), comment("b", Some("a"))];
        comments[1].id = CommentId::from("tmp-1");
        comments.push(comment("c", Some("tmp-1")));
        let text = render_text(&comments, Utc::now());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("user [just now]: body a"));
        assert!(lines[1].starts_with("  user [just now] (sending): body b"));
        assert!(lines[2].starts_with("    user"));
    }

    fn arb_comments() -> impl Strategy<Value = Vec<Comment>> {
        let id = 0u8..12;
        let parent = prop_oneof![Just(None), (0u8..14).prop_map(Some)];
        prop::collection::vec((id, parent), 0..40).prop_map(|rows| {
            rows.into_iter()
                .map(|(id, parent)| {
                    let id = id.to_string();
                    let parent = parent.map(|p| p.to_string());
                    comment(&id, parent.as_deref())
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn traversal_terminates_and_visits_each_id_once(comments in arb_comments()) {
            let tree = CommentTree::build(&comments);
            let entries = tree.flatten();
            let mut seen = HashSet::new();
            for e in &entries {
                prop_assert!(seen.insert(e.comment.id.as_str()));
            }
            prop_assert!(entries.len() <= comments.len());
        }

        #[test]
        fn every_visible_reply_has_a_visible_parent(comments in arb_comments()) {
            let tree = CommentTree::build(&comments);
            let entries = tree.flatten();
            let visible: HashSet<&str> = entries.iter().map(|e| e.comment.id.as_str()).collect();
            for e in &entries {
                match &e.comment.parent_id {
                    None => prop_assert_eq!(e.depth, 0),
                    Some(p) => {
                        prop_assert!(visible.contains(p.as_str()));
                        prop_assert!(e.depth > 0);
                    }
                }
            }
        }
    }
}
