//! UI Route Table
//!
//! The browser-side path space of the docval UI, shared by the server (which
//! serves the SPA shell for these paths) and by tests.
//!
//! | Path | Name |
//! |------|------|
//! | `/` | redirect to `/projects` |
//! | `/projects` | `projects` |
//! | `/projects/:projectId/documents` | `documents` |
//! | `/documents/:documentId` | `document-detail` |
//! | `/documents/:documentId/upload/:uploadId` | `upload-detail` |
//!
//! The Leptos UI crate declares the same table with `leptos_router`.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use thiserror::Error;

/// Symbolic names of the UI routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteName {
    Projects,
    Documents,
    DocumentDetail,
    UploadDetail,
}

impl RouteName {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteName::Projects => "projects",
            RouteName::Documents => "documents",
            RouteName::DocumentDetail => "document-detail",
            RouteName::UploadDetail => "upload-detail",
        }
    }

    /// Path pattern of the named route
    pub const fn pattern(self) -> &'static str {
        match self {
            RouteName::Projects => "/projects",
            RouteName::Documents => "/projects/:projectId/documents",
            RouteName::DocumentDetail => "/documents/:documentId",
            RouteName::UploadDetail => "/documents/:documentId/upload/:uploadId",
        }
    }

    /// Parse a route name as produced by [`RouteName::as_str`]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "projects" => Some(RouteName::Projects),
            "documents" => Some(RouteName::Documents),
            "document-detail" => Some(RouteName::DocumentDetail),
            "upload-detail" => Some(RouteName::UploadDetail),
            _ => None,
        }
    }
}

impl fmt::Display for RouteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single route record
#[derive(Debug, Clone, Copy)]
pub struct RouteDef {
    /// Path pattern, `:name` segments are parameters
    pub path: &'static str,
    /// Route name (redirect entries have none)
    pub name: Option<RouteName>,
    /// Redirect target, if this entry only redirects
    pub redirect: Option<&'static str>,
}

/// The route table, matched in declaration order
pub const ROUTES: &[RouteDef] = &[
    RouteDef {
        path: "/",
        name: None,
        redirect: Some("/projects"),
    },
    RouteDef {
        path: RouteName::Projects.pattern(),
        name: Some(RouteName::Projects),
        redirect: None,
    },
    RouteDef {
        path: RouteName::Documents.pattern(),
        name: Some(RouteName::Documents),
        redirect: None,
    },
    RouteDef {
        path: RouteName::DocumentDetail.pattern(),
        name: Some(RouteName::DocumentDetail),
        redirect: None,
    },
    RouteDef {
        path: RouteName::UploadDetail.pattern(),
        name: Some(RouteName::UploadDetail),
        redirect: None,
    },
];

/// Named parameters extracted from a path
pub type RouteParams = BTreeMap<String, String>;

/// Outcome of resolving a path against the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Matched { name: RouteName, params: RouteParams },
    Redirect { to: &'static str },
    NotFound,
}

/// Route table errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RouteError {
    #[error("Route '{route}' requires parameter '{param}'")]
    MissingParam { route: RouteName, param: String },

    #[error("Invalid route table: {0}")]
    InvalidTable(String),
}

/// Resolve a request path to a route
pub fn resolve(path: &str) -> Resolution {
    let path = strip_suffixes(path);

    for def in ROUTES {
        if let Some(params) = match_pattern(def.path, path) {
            if let Some(to) = def.redirect {
                return Resolution::Redirect { to };
            }
            if let Some(name) = def.name {
                return Resolution::Matched { name, params };
            }
        }
    }

    Resolution::NotFound
}

/// Build a concrete path for a named route
pub fn href(name: RouteName, params: &RouteParams) -> Result<String, RouteError> {
    let mut out = String::new();
    for segment in name.pattern().split('/').skip(1) {
        out.push('/');
        match segment.strip_prefix(':') {
            Some(param) => {
                let value = params
                    .get(param)
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| RouteError::MissingParam {
                        route: name,
                        param: param.to_string(),
                    })?;
                out.push_str(&urlencoding::encode(value));
            }
            None => out.push_str(segment),
        }
    }

    Ok(out)
}

/// Check [`ROUTES`]
pub fn validate_table() -> Result<(), RouteError> {
    validate_routes(ROUTES)
}

/// Check a route table: absolute patterns, unique names, no repeated
/// parameters, and named entries on their name's pattern
pub fn validate_routes(routes: &[RouteDef]) -> Result<(), RouteError> {
    let mut names = HashSet::new();

    for def in routes {
        if !def.path.starts_with('/') {
            return Err(RouteError::InvalidTable(format!(
                "pattern '{}' is not absolute",
                def.path
            )));
        }

        if def.name.is_none() == def.redirect.is_none() {
            return Err(RouteError::InvalidTable(format!(
                "pattern '{}' must have exactly one of name or redirect",
                def.path
            )));
        }

        let mut params = HashSet::new();
        for param in def.path.split('/').filter_map(|s| s.strip_prefix(':')) {
            if param.is_empty() || !params.insert(param) {
                return Err(RouteError::InvalidTable(format!(
                    "pattern '{}' has an empty or repeated parameter",
                    def.path
                )));
            }
        }

        if let Some(name) = def.name {
            if def.path != name.pattern() {
                return Err(RouteError::InvalidTable(format!(
                    "route '{}' is declared on '{}' instead of '{}'",
                    name,
                    def.path,
                    name.pattern()
                )));
            }
            if !names.insert(name) {
                return Err(RouteError::InvalidTable(format!(
                    "route name '{}' is declared twice",
                    name
                )));
            }
        }
    }

    Ok(())
}

/// Drop query string, fragment and a single trailing slash
fn strip_suffixes(path: &str) -> &str {
    let end = path.find(|c: char| c == '?' || c == '#').unwrap_or(path.len());
    let path = &path[..end];

    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

fn match_pattern(pattern: &str, path: &str) -> Option<RouteParams> {
    let mut pattern_segments = pattern.split('/');
    let mut path_segments = path.split('/');
    let mut params = RouteParams::new();

    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return Some(params),
            (Some(expected), Some(actual)) => match expected.strip_prefix(':') {
                Some(param) => {
                    if actual.is_empty() {
                        return None;
                    }
                    let value = urlencoding::decode(actual)
                        .map(|v| v.into_owned())
                        .unwrap_or_else(|_| actual.to_string());
                    params.insert(param.to_string(), value);
                }
                None if expected == actual => {}
                None => return None,
            },
            _ => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> RouteParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn named(path: &'static str, name: RouteName) -> RouteDef {
        RouteDef {
            path,
            name: Some(name),
            redirect: None,
        }
    }

    fn assert_invalid(routes: &[RouteDef], fragment: &str) {
        match validate_routes(routes) {
            Err(RouteError::InvalidTable(msg)) => {
                assert!(msg.contains(fragment), "unexpected message: {}", msg)
            }
            other => panic!("expected InvalidTable, got {:?}", other),
        }
    }

    #[test]
    fn test_table_is_valid() {
        assert!(validate_table().is_ok());
    }

    #[test]
    fn test_rejects_relative_pattern() {
        let routes = [RouteDef {
            path: "projects",
            name: None,
            redirect: Some("/projects"),
        }];
        assert_invalid(&routes, "not absolute");
    }

    #[test]
    fn test_rejects_repeated_parameter() {
        let routes = [RouteDef {
            path: "/documents/:id/upload/:id",
            name: None,
            redirect: Some("/projects"),
        }];
        assert_invalid(&routes, "empty or repeated parameter");
    }

    #[test]
    fn test_rejects_empty_parameter() {
        let routes = [RouteDef {
            path: "/documents/:",
            name: None,
            redirect: Some("/projects"),
        }];
        assert_invalid(&routes, "empty or repeated parameter");
    }

    #[test]
    fn test_rejects_duplicate_name() {
        let routes = [
            named(RouteName::Projects.pattern(), RouteName::Projects),
            named(RouteName::Projects.pattern(), RouteName::Projects),
        ];
        assert_invalid(&routes, "declared twice");
    }

    #[test]
    fn test_rejects_name_on_foreign_pattern() {
        let routes = [named("/documents/:documentId", RouteName::Projects)];
        assert_invalid(&routes, "instead of");
    }

    #[test]
    fn test_rejects_entry_with_name_and_redirect() {
        let routes = [RouteDef {
            path: "/projects",
            name: Some(RouteName::Projects),
            redirect: Some("/"),
        }];
        assert_invalid(&routes, "exactly one of name or redirect");

        let routes = [RouteDef {
            path: "/projects",
            name: None,
            redirect: None,
        }];
        assert_invalid(&routes, "exactly one of name or redirect");
    }

    #[test]
    fn test_root_redirects_to_projects() {
        assert_eq!(resolve("/"), Resolution::Redirect { to: "/projects" });
        assert_eq!(resolve("/?tab=1"), Resolution::Redirect { to: "/projects" });
    }

    #[test]
    fn test_projects() {
        assert_eq!(
            resolve("/projects"),
            Resolution::Matched {
                name: RouteName::Projects,
                params: RouteParams::new()
            }
        );
        // One trailing slash is tolerated
        assert_eq!(
            resolve("/projects/"),
            Resolution::Matched {
                name: RouteName::Projects,
                params: RouteParams::new()
            }
        );
    }

    #[test]
    fn test_documents_extracts_project_id() {
        assert_eq!(
            resolve("/projects/p-42/documents"),
            Resolution::Matched {
                name: RouteName::Documents,
                params: params(&[("projectId", "p-42")])
            }
        );
    }

    #[test]
    fn test_document_detail() {
        assert_eq!(
            resolve("/documents/abc#top"),
            Resolution::Matched {
                name: RouteName::DocumentDetail,
                params: params(&[("documentId", "abc")])
            }
        );
    }

    #[test]
    fn test_upload_detail_extracts_both_ids() {
        assert_eq!(
            resolve("/documents/d1/upload/u9"),
            Resolution::Matched {
                name: RouteName::UploadDetail,
                params: params(&[("documentId", "d1"), ("uploadId", "u9")])
            }
        );
    }

    #[test]
    fn test_params_are_percent_decoded() {
        assert_eq!(
            resolve("/documents/a%20b"),
            Resolution::Matched {
                name: RouteName::DocumentDetail,
                params: params(&[("documentId", "a b")])
            }
        );
    }

    #[test]
    fn test_unmatched_paths() {
        assert_eq!(resolve("/projects/p1"), Resolution::NotFound);
        assert_eq!(resolve("/documents//upload/u1"), Resolution::NotFound);
        assert_eq!(resolve("/Projects"), Resolution::NotFound);
        assert_eq!(resolve("/documents/d1/upload"), Resolution::NotFound);
        assert_eq!(resolve("/settings"), Resolution::NotFound);
    }

    #[test]
    fn test_href_round_trip() {
        let p = params(&[("documentId", "d 1"), ("uploadId", "u2")]);
        let path = href(RouteName::UploadDetail, &p).unwrap();
        assert_eq!(path, "/documents/d%201/upload/u2");
        assert_eq!(
            resolve(&path),
            Resolution::Matched {
                name: RouteName::UploadDetail,
                params: p
            }
        );
    }

    #[test]
    fn test_href_missing_param() {
        let err = href(RouteName::Documents, &RouteParams::new()).unwrap_err();
        assert_eq!(
            err,
            RouteError::MissingParam {
                route: RouteName::Documents,
                param: "projectId".to_string()
            }
        );
    }

    #[test]
    fn test_every_name_has_a_table_entry() {
        let all = params(&[("projectId", "p"), ("documentId", "d"), ("uploadId", "u")]);
        for name in [
            RouteName::Projects,
            RouteName::Documents,
            RouteName::DocumentDetail,
            RouteName::UploadDetail,
        ] {
            assert!(ROUTES
                .iter()
                .any(|d| d.name == Some(name) && d.path == name.pattern()));

            let path = href(name, &all).unwrap();
            assert!(matches!(resolve(&path), Resolution::Matched { name: n, .. } if n == name));
        }
    }

    #[test]
    fn test_route_name_parse() {
        for name in [
            RouteName::Projects,
            RouteName::Documents,
            RouteName::DocumentDetail,
            RouteName::UploadDetail,
        ] {
            assert_eq!(RouteName::parse(name.as_str()), Some(name));
        }
        assert_eq!(RouteName::parse("settings"), None);
    }
}
