//! Path-by-path rewriting of a set into a new one
//!
//! A [PathRewriter] either writes the replacement for a path and accepts it, or rejects the path.
//! Rejected paths are left out of the result, and paths that are rewritten to the same bytes collapse
//! into one member.

use regex::bytes::Regex;
use tracing::debug;

use crate::error::TransformError;
use crate::trie_set::PathTrieSet;

/// Rewrites one path at a time
pub trait PathRewriter {
    /// Writes the replacement for `path` into `out`, which is empty on entry.  Returns `false` to
    /// leave `path` out of the result
    fn rewrite(&self, path: &[u8], out: &mut Vec<u8>) -> bool;
}

impl<F: Fn(&[u8], &mut Vec<u8>) -> bool> PathRewriter for F {
    fn rewrite(&self, path: &[u8], out: &mut Vec<u8>) -> bool {
        self(path, out)
    }
}

/// Rewrites paths that match a regular expression by expanding a template with the captures
///
/// The pattern is searched for anywhere in the raw path bytes, so it should be anchored with `^` and
/// `$` to match whole paths.  The template uses the `$1` and `${name}` syntax of
/// [Captures::expand](regex::bytes::Captures::expand), and `$$` for a literal `$`.  The output is the
/// expanded template alone, not the path with the match replaced.
#[derive(Debug, Clone)]
pub struct RegexRewriter {
    regex: Regex,
    template: Vec<u8>,
}

impl RegexRewriter {
    pub fn new<T: AsRef<[u8]>>(pattern: &str, template: T) -> Result<Self, TransformError> {
        Ok(Self { regex: Regex::new(pattern)?, template: template.as_ref().to_vec() })
    }
}

impl PathRewriter for RegexRewriter {
    fn rewrite(&self, path: &[u8], out: &mut Vec<u8>) -> bool {
        match self.regex.captures(path) {
            Some(caps) => {
                caps.expand(&self.template, out);
                true
            },
            None => false,
        }
    }
}

impl PathTrieSet {
    /// Returns the set of rewrites of every path the `rewriter` accepts
    pub fn transform<R: PathRewriter + ?Sized>(&self, rewriter: &R) -> Self {
        let mut rewritten = Vec::new();
        for path in self.iter() {
            let mut out = Vec::new();
            if rewriter.rewrite(&path, &mut out) {
                rewritten.push(out);
            }
        }
        Self::from_paths(rewritten)
    }

    /// Rewrites every path matching `pattern` into `template` with the captures substituted, and
    /// drops the paths that don't match.  See [RegexRewriter]
    ///
    /// ```
    /// # use pathset::PathTrieSet;
    /// let dates = PathTrieSet::from_paths(["2024-05-01", "2023-11-30", "someday"]);
    /// let flipped = dates.regex_transform(r"^(\d+)-(\d+)-(\d+)$", "$3/$2/$1").unwrap();
    /// assert_eq!(flipped, PathTrieSet::from_paths(["01/05/2024", "30/11/2023"]));
    /// ```
    pub fn regex_transform<T: AsRef<[u8]>>(&self, pattern: &str, template: T) -> Result<Self, TransformError> {
        let rewriter = RegexRewriter::new(pattern, template)?;
        let result = self.transform(&rewriter);
        debug!(pattern, paths_in = self.val_count(), paths_out = result.val_count(), "regex transform");
        Ok(result)
    }
}
