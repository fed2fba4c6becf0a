//! Request-scoped filtering of candidate changes.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{change::Change, error::Result};

/// How the pattern fields of a [`Filter`] are interpreted.
///
/// `Include` keeps matching candidates, `Exclude` negates the match.
/// `Start` and `Stop` window the ordered candidate list: `Start` drops
/// everything before the first match, `Stop` keeps everything through the
/// first match and drops the rest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    #[default]
    Include,
    Exclude,
    Start,
    Stop,
}

/// Narrowing criteria applied to the scan candidates of one request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Filter {
    pub id: Option<String>,
    pub tag: Option<String>,
    /// Take-limit: candidates beyond it are reported as ignored.
    pub count: Option<usize>,
    /// Lower bound on `created`.
    pub created: Option<DateTime<Utc>>,
    /// Regex matched against the artifact path.
    pub name: Option<String>,
    /// Regex matched against the artifact path.
    pub file: Option<String>,
    #[serde(default)]
    pub kind: FilterKind,
}

impl Filter {
    /// Compiles the pattern fields, `name` first.
    pub fn pattern(&self) -> Result<Option<Regex>> {
        let source = self.name.as_deref().or(self.file.as_deref());

        Ok(match source {
            Some(source) => Some(Regex::new(source)?),
            None => None,
        })
    }

    /// Per-change acceptance for `Include`/`Exclude` kinds.
    ///
    /// `pattern` is the pre-compiled result of [`Filter::pattern`]; the
    /// positional `Start`/`Stop` kinds are handled over the whole ordered
    /// candidate list instead, see [`Filter::window`].
    pub fn accepts(&self, change: &Change, pattern: Option<&Regex>) -> bool {
        if let Some(id) = &self.id {
            if change.id.as_deref() != Some(id.as_str()) {
                return false;
            }
        }

        if let Some(tag) = &self.tag {
            if !change.tags.iter().any(|t| t == tag) {
                return false;
            }
        }

        if let Some(bound) = self.created {
            match change.created {
                Some(created) if created >= bound => {}
                _ => return false,
            }
        }

        if let Some(pattern) = pattern {
            let matched = pattern.is_match(&change.file.to_string_lossy());

            return match self.kind {
                FilterKind::Exclude => !matched,
                _ => matched,
            };
        }

        true
    }

    /// Applies the positional `Start`/`Stop` kinds to the ordered
    /// candidate list, returning the retained window and the dropped
    /// candidates.
    pub fn window(&self, candidates: Vec<Change>, pattern: Option<&Regex>) -> (Vec<Change>, Vec<Change>) {
        let pattern = match (self.kind, pattern) {
            (FilterKind::Start | FilterKind::Stop, Some(pattern)) => pattern,
            _ => return (candidates, Vec::new()),
        };

        let mut kept = Vec::new();
        let mut dropped = Vec::new();
        let mut boundary = false;

        for change in candidates {
            let matched = pattern.is_match(&change.file.to_string_lossy());

            match self.kind {
                FilterKind::Start => {
                    if matched {
                        boundary = true;
                    }
                    if boundary {
                        kept.push(change);
                    } else {
                        dropped.push(change);
                    }
                }
                FilterKind::Stop => {
                    if boundary {
                        dropped.push(change);
                    } else {
                        kept.push(change);
                    }
                    if matched {
                        boundary = true;
                    }
                }
                _ => unreachable!(),
            }
        }

        (kept, dropped)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn change(file: &str) -> Change {
        Change {
            name: "x".to_owned(),
            file: PathBuf::from(file),
            ..Change::default()
        }
    }

    #[test]
    fn include_matches_against_file() {
        let filter = Filter {
            name: Some("addUsers".to_owned()),
            ..Filter::default()
        };
        let pattern = filter.pattern().unwrap();

        assert!(filter.accepts(&change("/m/1.addUsers.commit.js"), pattern.as_ref()));
        assert!(!filter.accepts(&change("/m/1.dropUsers.commit.js"), pattern.as_ref()));
    }

    #[test]
    fn exclude_negates_the_match() {
        let filter = Filter {
            name: Some("addUsers".to_owned()),
            kind: FilterKind::Exclude,
            ..Filter::default()
        };
        let pattern = filter.pattern().unwrap();

        assert!(!filter.accepts(&change("/m/1.addUsers.commit.js"), pattern.as_ref()));
        assert!(filter.accepts(&change("/m/1.dropUsers.commit.js"), pattern.as_ref()));
    }

    #[test]
    fn tag_filter_requires_membership() {
        let filter = Filter {
            tag: Some("seed".to_owned()),
            ..Filter::default()
        };

        let mut tagged = change("/m/1.a.commit.js");
        tagged.tags.push("seed".to_owned());

        assert!(filter.accepts(&tagged, None));
        assert!(!filter.accepts(&change("/m/1.b.commit.js"), None));
    }

    #[test]
    fn start_window_drops_the_head() {
        let filter = Filter {
            name: Some("b\\.commit".to_owned()),
            kind: FilterKind::Start,
            ..Filter::default()
        };
        let pattern = filter.pattern().unwrap();

        let candidates = vec![
            change("/m/1.a.commit.js"),
            change("/m/2.b.commit.js"),
            change("/m/3.c.commit.js"),
        ];
        let (kept, dropped) = filter.window(candidates, pattern.as_ref());

        assert_eq!(kept.len(), 2);
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].file, PathBuf::from("/m/1.a.commit.js"));
    }

    #[test]
    fn stop_window_keeps_through_first_match() {
        let filter = Filter {
            name: Some("b\\.commit".to_owned()),
            kind: FilterKind::Stop,
            ..Filter::default()
        };
        let pattern = filter.pattern().unwrap();

        let candidates = vec![
            change("/m/1.a.commit.js"),
            change("/m/2.b.commit.js"),
            change("/m/3.c.commit.js"),
        ];
        let (kept, dropped) = filter.window(candidates, pattern.as_ref());

        assert_eq!(kept.len(), 2);
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].file, PathBuf::from("/m/3.c.commit.js"));
    }
}
