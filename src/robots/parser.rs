//! Robots.txt policy compilation and matching
//!
//! The robots.txt body is tokenized once by the robotstxt crate's parser and
//! compiled into agent groups. Queries afterwards never touch the raw text.

use robotstxt::{parse_robotstxt, RobotsParseHandler};
use url::Url;

/// Compiled robots.txt rule set
///
/// A policy is immutable once built and answers queries through `&self`, so
/// it can be shared between workers without synchronization.
///
/// Anything the parser does not understand is ignored. A body with no usable
/// groups therefore allows every path, which is also the policy used when
/// robots.txt could not be fetched at all.
#[derive(Debug, Clone, Default)]
pub struct RobotsPolicy {
    groups: Vec<AgentGroup>,
    sitemaps: Vec<String>,
}

#[derive(Debug, Clone)]
struct AgentGroup {
    /// Lowercased product tokens, `*` for the wildcard group
    agents: Vec<String>,
    rules: Vec<Rule>,
}

#[derive(Debug, Clone)]
struct Rule {
    allow: bool,
    pattern: String,
}

impl RobotsPolicy {
    /// Compiles a robots.txt body
    ///
    /// # Arguments
    ///
    /// * `content` - The raw robots.txt file content
    ///
    /// # Returns
    ///
    /// The compiled policy. Malformed content never fails; unusable lines are
    /// skipped.
    pub fn from_content(content: &str) -> Self {
        let mut builder = PolicyBuilder::default();
        parse_robotstxt(content, &mut builder);

        Self {
            groups: builder.groups,
            sitemaps: builder.sitemaps,
        }
    }

    /// Creates a permissive policy that allows everything
    ///
    /// This is used when robots.txt cannot be fetched.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Returns the sitemap URLs declared with `Sitemap:` lines
    pub fn sitemaps(&self) -> &[String] {
        &self.sitemaps
    }

    /// Checks if a path is allowed for the given user agent
    ///
    /// # Matching
    ///
    /// - The groups naming the product token of `user_agent` (the leading
    ///   name before `/` or whitespace, case insensitive) apply and are
    ///   merged. Without one, the `*` group applies. Without either,
    ///   everything is allowed.
    /// - Patterns arrive percent-encoded from the tokenizer, so `/ü` matches
    ///   the request path `/%C3%BC`.
    /// - The longest matching `Allow`/`Disallow` pattern decides; on a tie
    ///   `Allow` wins. Patterns support `*` and a trailing `$`.
    /// - `/robots.txt` itself is always allowed.
    ///
    /// # Arguments
    ///
    /// * `path` - The path (plus query) to check, e.g. "/page.html?x=1".
    ///   Absolute URLs are reduced to their path and query.
    /// * `user_agent` - The user agent string
    pub fn is_allowed(&self, path: &str, user_agent: &str) -> bool {
        let path = request_path(path);
        if path == "/robots.txt" {
            return true;
        }

        let groups = self.groups_for(user_agent);
        if groups.is_empty() {
            return true;
        }

        let mut longest_allow: Option<usize> = None;
        let mut longest_disallow: Option<usize> = None;

        for rule in groups.iter().flat_map(|group| group.rules.iter()) {
            if !pattern_matches(&path, &rule.pattern) {
                continue;
            }
            let slot = if rule.allow {
                &mut longest_allow
            } else {
                &mut longest_disallow
            };
            *slot = (*slot).max(Some(rule.pattern.len()));
        }

        match (longest_disallow, longest_allow) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(disallow), Some(allow)) => allow >= disallow,
        }
    }

    fn groups_for(&self, user_agent: &str) -> Vec<&AgentGroup> {
        let token = agent_token(user_agent);
        let named = |wanted: &str| -> Vec<&AgentGroup> {
            self.groups
                .iter()
                .filter(|group| group.agents.iter().any(|agent| agent == wanted))
                .collect()
        };

        let specific = if token.is_empty() || token == "*" {
            Vec::new()
        } else {
            named(&token)
        };

        if specific.is_empty() {
            named("*")
        } else {
            specific
        }
    }
}

/// Receives parser callbacks and accumulates agent groups
///
/// Consecutive `User-agent` lines share one group; the first rule line closes
/// the agent list, so the next `User-agent` line starts a new group.
#[derive(Default)]
struct PolicyBuilder {
    groups: Vec<AgentGroup>,
    sitemaps: Vec<String>,
    current: Option<usize>,
    collecting_agents: bool,
}

impl PolicyBuilder {
    fn push_rule(&mut self, allow: bool, value: &str) {
        self.collecting_agents = false;

        // Rules before any User-agent line belong to nobody
        let Some(index) = self.current else {
            return;
        };

        // An empty pattern matches nothing, so `Disallow:` allows everything
        if value.is_empty() {
            return;
        }

        self.groups[index].rules.push(Rule {
            allow,
            pattern: value.to_string(),
        });
    }
}

impl RobotsParseHandler for PolicyBuilder {
    fn handle_robots_start(&mut self) {}

    fn handle_robots_end(&mut self) {}

    fn handle_user_agent(&mut self, _line_num: u32, user_agent: &str) {
        let token = agent_token(user_agent);
        if token.is_empty() {
            return;
        }

        match self.current {
            Some(index) if self.collecting_agents => self.groups[index].agents.push(token),
            _ => {
                self.groups.push(AgentGroup {
                    agents: vec![token],
                    rules: Vec::new(),
                });
                self.current = Some(self.groups.len() - 1);
                self.collecting_agents = true;
            }
        }
    }

    fn handle_allow(&mut self, _line_num: u32, value: &str) {
        self.push_rule(true, value);
    }

    fn handle_disallow(&mut self, _line_num: u32, value: &str) {
        self.push_rule(false, value);
    }

    fn handle_sitemap(&mut self, _line_num: u32, value: &str) {
        if !value.is_empty() {
            self.sitemaps.push(value.to_string());
        }
    }

    fn handle_unknown_action(&mut self, _line_num: u32, _action: &str, _value: &str) {}
}

/// Extracts the product token from a `User-agent` value
///
/// `Googlebot/2.1 (+http://www.google.com/bot.html)` yields `googlebot`.
fn agent_token(value: &str) -> String {
    let value = value.trim();
    if value.starts_with('*') {
        return "*".to_string();
    }

    value
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect::<String>()
        .to_lowercase()
}

/// Reduces the query argument to the path plus query rules are matched against
fn request_path(path: &str) -> String {
    if path.starts_with('/') {
        return path.to_string();
    }

    match Url::parse(path) {
        Ok(url) => match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        },
        Err(_) => format!("/{}", path),
    }
}

/// Matches a path against a robots pattern with `*` and trailing `$` support
///
/// Tracks every path offset the pattern prefix can end at, so wildcards never
/// backtrack.
fn pattern_matches(path: &str, pattern: &str) -> bool {
    let path = path.as_bytes();
    let pattern = pattern.as_bytes();
    let mut positions: Vec<usize> = vec![0];

    for (i, &c) in pattern.iter().enumerate() {
        if c == b'$' && i + 1 == pattern.len() {
            return positions.last() == Some(&path.len());
        }

        if c == b'*' {
            positions = (positions[0]..=path.len()).collect();
        } else {
            positions = positions
                .into_iter()
                .filter(|&p| p < path.len() && path[p] == c)
                .map(|p| p + 1)
                .collect();
            if positions.is_empty() {
                return false;
            }
        }
    }

    true
}
