use crate::domain::http::{Method, PathParams};
use crate::domain::ports::Handler;
use crate::utils::error::{ApiError, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed path template such as `/pets/{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

impl PathTemplate {
    pub fn parse(template: &str) -> Result<Self> {
        let invalid = |reason: &str| ApiError::InvalidPathTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        if !template.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        let mut segments = Vec::new();
        for segment in split_path(template) {
            if let Some(name) = segment
                .strip_prefix('{')
                .and_then(|rest| rest.strip_suffix('}'))
            {
                if name.is_empty() || name.contains(['{', '}']) {
                    return Err(invalid("empty or nested parameter name"));
                }
                if segments
                    .iter()
                    .any(|s| matches!(s, Segment::Param(existing) if existing == name))
                {
                    return Err(invalid(&format!("parameter {{{}}} appears twice", name)));
                }
                segments.push(Segment::Param(name.to_string()));
            } else if segment.contains(['{', '}']) {
                return Err(invalid("parameters must span a whole segment"));
            } else {
                segments.push(Segment::Literal(segment.to_string()));
            }
        }

        // 正規化：去掉結尾斜線，`/pets/` 與 `/pets` 視為同一個 key
        let mut raw = String::new();
        for segment in &segments {
            raw.push('/');
            match segment {
                Segment::Literal(text) => raw.push_str(text),
                Segment::Param(name) => {
                    raw.push('{');
                    raw.push_str(name);
                    raw.push('}');
                }
            }
        }
        if raw.is_empty() {
            raw.push('/');
        }

        Ok(Self { raw, segments })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Matches a request path literally. One trailing slash is tolerated;
    /// empty segments (`//pets`, `/pets//1`) never match.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let rest = path.strip_prefix('/')?;
        let rest = rest.strip_suffix('/').unwrap_or(rest);
        let parts: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('/').collect()
        };
        if parts.len() != self.segments.len() || parts.iter().any(|part| part.is_empty()) {
            return None;
        }

        let mut params = PathParams::default();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(text) if text == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => params.push(name, part),
            }
        }
        Some(params)
    }

    /// Two templates overlap when some concrete path matches both.
    pub fn overlaps(&self, other: &PathTemplate) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    _ => true,
                })
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Which security schemes an operation requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityRequirement {
    /// Use the API-wide default schemes.
    Inherit,
    /// Any one of these schemes grants access; empty means anonymous.
    AnyOf(Vec<String>),
}

#[derive(Clone)]
pub struct Operation {
    method: Method,
    template: PathTemplate,
    handler: Arc<dyn Handler>,
    security: SecurityRequirement,
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("method", &self.method)
            .field("template", &self.template.as_str())
            .field("parameter_model", &self.handler.parameter_model())
            .field("security", &self.security)
            .finish()
    }
}

impl Operation {
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    pub fn security(&self) -> &SecurityRequirement {
        &self.security
    }

    /// Declared schemes, empty when the operation is anonymous or still
    /// inherits a default that was never resolved.
    pub fn schemes(&self) -> &[String] {
        match &self.security {
            SecurityRequirement::AnyOf(schemes) => schemes,
            SecurityRequirement::Inherit => &[],
        }
    }

    /// `GET /pets/{id}` style label for logs and errors.
    pub fn id(&self) -> String {
        format!("{} {}", self.method, self.template)
    }

    pub fn secured_by<I, S>(&mut self, schemes: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.security = SecurityRequirement::AnyOf(schemes.into_iter().map(Into::into).collect());
        self
    }

    pub fn no_security(&mut self) -> &mut Self {
        self.security = SecurityRequirement::AnyOf(Vec::new());
        self
    }

    pub(crate) fn resolve_default_security(&mut self, defaults: &[String]) {
        if self.security == SecurityRequirement::Inherit {
            self.security = SecurityRequirement::AnyOf(defaults.to_vec());
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct OperationRegistry {
    // 保留註冊順序：重疊的樣板由先註冊者勝出
    routes: HashMap<Method, Vec<Operation>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `(method, template)`. An identical key
    /// replaces the previous handler in place, keeping its position.
    pub fn register(
        &mut self,
        method: Method,
        template: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<&mut Operation> {
        let template = PathTemplate::parse(template)?;
        let routes = self.routes.entry(method).or_default();

        let operation = Operation {
            method,
            template,
            handler,
            security: SecurityRequirement::Inherit,
        };

        match routes
            .iter()
            .position(|existing| existing.template == operation.template)
        {
            Some(index) => {
                tracing::debug!("Replacing handler for {}", operation.id());
                routes[index] = operation;
                Ok(&mut routes[index])
            }
            None => {
                routes.push(operation);
                let last = routes.len() - 1;
                Ok(&mut routes[last])
            }
        }
    }

    pub fn resolve(&self, method: Method, path: &str) -> Result<(&Operation, PathParams)> {
        self.routes
            .get(&method)
            .and_then(|routes| {
                routes.iter().find_map(|operation| {
                    operation
                        .template
                        .matches(path)
                        .map(|params| (operation, params))
                })
            })
            .ok_or_else(|| ApiError::RouteNotFound {
                method: method.to_string(),
                path: path.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.routes.values().flatten()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Operation> {
        self.routes.values_mut().flatten()
    }

    /// Pairs of templates registered for the same method that can match the
    /// same concrete path, earlier registration first.
    pub fn overlapping(&self) -> Vec<(String, String)> {
        let mut methods: Vec<_> = self.routes.keys().copied().collect();
        methods.sort();

        let mut pairs = Vec::new();
        for method in methods {
            let routes = &self.routes[&method];
            for (i, first) in routes.iter().enumerate() {
                for second in &routes[i + 1..] {
                    if first.template.overlaps(&second.template) {
                        pairs.push((first.id(), second.id()));
                    }
                }
            }
        }
        pairs
    }
}
