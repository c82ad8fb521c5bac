//! Loader selection: configured rules plus inline loader requests

use std::path::Path;

use regex::Regex;

use crate::config::{Enforce, RuleConfig};
use crate::error::BuildError;

/// Leading `!`/`-!`/`!!` of a request, deciding which rule categories
/// take part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlinePrefix {
    /// No prefix: post, inline, normal, pre
    None,
    /// `!`: normal rules disabled
    NoNormal,
    /// `-!`: pre and normal rules disabled
    NoPreNormal,
    /// `!!`: only inline loaders
    OnlyInline,
}

/// A request split into its prefix, inline loaders and resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineRequest {
    pub prefix: InlinePrefix,
    pub loaders: Vec<String>,
    pub resource: String,
}

impl InlineRequest {
    /// Split `a-loader!b-loader!./file.js`. Empty loader segments are
    /// dropped.
    pub fn parse(request: &str) -> Self {
        let prefix = if request.starts_with("!!") {
            InlinePrefix::OnlyInline
        } else if request.starts_with("-!") {
            InlinePrefix::NoPreNormal
        } else if request.starts_with('!') {
            InlinePrefix::NoNormal
        } else {
            InlinePrefix::None
        };

        let stripped = match request.strip_prefix('-') {
            Some(rest) if rest.starts_with('!') => rest,
            _ => request,
        };
        let stripped = stripped.trim_start_matches('!');

        let mut segments: Vec<&str> = stripped.split('!').collect();
        let resource = segments.pop().unwrap_or_default().to_string();
        let loaders = segments
            .into_iter()
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            prefix,
            loaders,
            resource,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    test: Regex,
    loaders: Vec<String>,
    enforce: Option<Enforce>,
}

impl Rule {
    pub fn matches(&self, resource: &str) -> bool {
        self.test.is_match(resource)
    }
}

/// Compiled `module.rules`, in configuration order
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn compile(configs: &[RuleConfig]) -> Result<Self, BuildError> {
        let rules = configs
            .iter()
            .map(|config| {
                let test = Regex::new(&config.test).map_err(|source| BuildError::InvalidRule {
                    pattern: config.test.clone(),
                    source,
                })?;
                Ok(Rule {
                    test,
                    loaders: config.loader_names(),
                    enforce: config.enforce,
                })
            })
            .collect::<Result<Vec<_>, BuildError>>()?;
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Loader names for `request` on the resolved `resource`, in pitch
    /// order
    pub fn loaders_for(&self, request: &InlineRequest, resource: &Path) -> Vec<String> {
        let resource = resource.to_string_lossy();
        let mut pre = Vec::new();
        let mut normal = Vec::new();
        let mut post = Vec::new();
        for rule in self.rules.iter().filter(|rule| rule.matches(&resource)) {
            let bucket = match rule.enforce {
                Some(Enforce::Pre) => &mut pre,
                Some(Enforce::Post) => &mut post,
                None => &mut normal,
            };
            bucket.extend(rule.loaders.iter().cloned());
        }

        let inline = request.loaders.iter().cloned();
        match request.prefix {
            InlinePrefix::OnlyInline => inline.collect(),
            InlinePrefix::NoPreNormal => post.into_iter().chain(inline).collect(),
            InlinePrefix::NoNormal => post.into_iter().chain(inline).chain(pre).collect(),
            InlinePrefix::None => post
                .into_iter()
                .chain(inline)
                .chain(normal)
                .chain(pre)
                .collect(),
        }
    }
}
