//! Ordered route table
//!
//! Requests are matched against a fixed list of rules, first match wins. The
//! passthrough rule matches everything and is always last, so [`RouteTable::resolve`]
//! is total.

use axum::http::Method;

pub const ROOT_PATH: &str = "/";
pub const EXECUTE_SCRIPT_PATH: &str = "/simulator/executeScript";
pub const STEAM_HOST_PATH: &str = "/game/getSteamHost";
pub const COMPONENT_DETAIL_PATH: &str = "/simulator/v2/getComponentDetail";
pub const COMPONENT_LIST_PATH: &str = "/simulator/v2/getComponentList";
pub const VERSIONED_PREFIX: &str = "/simulator/v2/";

/// Handler selected for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Preflight,
    Health,
    ExecuteScript,
    SteamHost,
    ComponentDetail,
    ComponentList,
    VersionedRewrite,
    Passthrough,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathMatcher {
    Exact(&'static str),
    Prefix(&'static str),
    Any,
}

impl PathMatcher {
    fn matches(&self, path: &str) -> bool {
        match self {
            PathMatcher::Exact(expected) => path == *expected,
            PathMatcher::Prefix(prefix) => path.starts_with(prefix),
            PathMatcher::Any => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodFilter {
    Any,
    Only(Vec<Method>),
}

impl MethodFilter {
    fn allows(&self, method: &Method) -> bool {
        match self {
            MethodFilter::Any => true,
            MethodFilter::Only(methods) => methods.contains(method),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouteRule {
    pub path: PathMatcher,
    pub method: MethodFilter,
    pub route: Route,
}

impl RouteRule {
    fn new(path: PathMatcher, method: MethodFilter, route: Route) -> Self {
        Self {
            path,
            method,
            route,
        }
    }

    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.method.allows(method) && self.path.matches(path)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RouteOptions {
    pub component_detail: bool,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            component_detail: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    pub fn new(options: RouteOptions) -> Self {
        let get_or_post = || MethodFilter::Only(vec![Method::GET, Method::POST]);

        let mut rules = vec![
            RouteRule::new(
                PathMatcher::Any,
                MethodFilter::Only(vec![Method::OPTIONS]),
                Route::Preflight,
            ),
            RouteRule::new(
                PathMatcher::Exact(ROOT_PATH),
                MethodFilter::Only(vec![Method::GET]),
                Route::Health,
            ),
            RouteRule::new(
                PathMatcher::Exact(EXECUTE_SCRIPT_PATH),
                MethodFilter::Only(vec![Method::POST]),
                Route::ExecuteScript,
            ),
            RouteRule::new(
                PathMatcher::Exact(STEAM_HOST_PATH),
                MethodFilter::Only(vec![Method::GET]),
                Route::SteamHost,
            ),
        ];

        if options.component_detail {
            rules.push(RouteRule::new(
                PathMatcher::Exact(COMPONENT_DETAIL_PATH),
                get_or_post(),
                Route::ComponentDetail,
            ));
        }

        rules.extend([
            RouteRule::new(
                PathMatcher::Exact(COMPONENT_LIST_PATH),
                get_or_post(),
                Route::ComponentList,
            ),
            RouteRule::new(
                PathMatcher::Prefix(VERSIONED_PREFIX),
                MethodFilter::Any,
                Route::VersionedRewrite,
            ),
            RouteRule::new(PathMatcher::Any, MethodFilter::Any, Route::Passthrough),
        ]);

        Self { rules }
    }

    pub fn resolve(&self, method: &Method, path: &str) -> Route {
        self.rules
            .iter()
            .find(|rule| rule.matches(method, path))
            .map(|rule| rule.route)
            .unwrap_or(Route::Passthrough)
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(RouteOptions::default())
    }
}

/// `/simulator/v2/x` becomes `/simulator/x`; other paths are returned unchanged
pub fn rewrite_versioned(path: &str) -> String {
    match path.strip_prefix(VERSIONED_PREFIX) {
        Some(rest) => format!("/simulator/{rest}"),
        None => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        let table = RouteTable::default();

        assert_eq!(table.resolve(&Method::OPTIONS, COMPONENT_LIST_PATH), Route::Preflight);
        assert_eq!(table.resolve(&Method::GET, "/"), Route::Health);
        assert_eq!(
            table.resolve(&Method::POST, EXECUTE_SCRIPT_PATH),
            Route::ExecuteScript
        );
        assert_eq!(table.resolve(&Method::GET, STEAM_HOST_PATH), Route::SteamHost);
        assert_eq!(
            table.resolve(&Method::GET, COMPONENT_DETAIL_PATH),
            Route::ComponentDetail
        );
        assert_eq!(
            table.resolve(&Method::POST, COMPONENT_LIST_PATH),
            Route::ComponentList
        );
        assert_eq!(
            table.resolve(&Method::GET, "/simulator/v2/getSomethingElse"),
            Route::VersionedRewrite
        );
        assert_eq!(table.resolve(&Method::GET, "/unknown/path"), Route::Passthrough);
    }

    #[test]
    fn test_method_mismatch_falls_through() {
        let table = RouteTable::default();

        // Root only answers GET
        assert_eq!(table.resolve(&Method::POST, "/"), Route::Passthrough);
        // executeScript only answers POST
        assert_eq!(
            table.resolve(&Method::GET, EXECUTE_SCRIPT_PATH),
            Route::Passthrough
        );
        // A PUT on the list path is still under the versioned prefix
        assert_eq!(
            table.resolve(&Method::PUT, COMPONENT_LIST_PATH),
            Route::VersionedRewrite
        );
    }

    #[test]
    fn test_detail_disabled() {
        let table = RouteTable::new(RouteOptions {
            component_detail: false,
        });

        assert_eq!(
            table.resolve(&Method::GET, COMPONENT_DETAIL_PATH),
            Route::VersionedRewrite
        );
        assert!(table.rules().iter().all(|r| r.route != Route::ComponentDetail));
    }

    #[test]
    fn test_fallback_is_last_and_unique() {
        for detail in [true, false] {
            let table = RouteTable::new(RouteOptions {
                component_detail: detail,
            });
            let catch_all: Vec<_> = table
                .rules()
                .iter()
                .enumerate()
                .filter(|(_, r)| r.path == PathMatcher::Any && r.method == MethodFilter::Any)
                .collect();

            assert_eq!(catch_all.len(), 1);
            assert_eq!(catch_all[0].0, table.rules().len() - 1);
        }
    }

    #[test]
    fn test_rewrite_versioned() {
        assert_eq!(rewrite_versioned("/simulator/v2/foo"), "/simulator/foo");
        assert_eq!(rewrite_versioned("/simulator/v2/a/b"), "/simulator/a/b");
        assert_eq!(rewrite_versioned("/simulator/v2/"), "/simulator/");
        assert_eq!(rewrite_versioned("/other"), "/other");
    }
}
