//! Route table module
//!
//! Maps (method, path pattern) pairs to API endpoints. Resolution walks the
//! table in order, so a path that matches but with the wrong method yields
//! the list of methods that would have been accepted.

use hyper::Method;

use super::matcher::{match_path, PathParams};

/// Every operation the API exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Root,
    Health,
    ListColleges,
    SearchColleges,
    GetCollege,
    CreateCollege,
    DeleteCollege,
    CreateAdmission,
    ListAdmissions,
    ListAllAdmissions,
    SetAdmissionStatus,
    DeleteAdmission,
    CreateReview,
    ListReviews,
    CreateUser,
    ListUsers,
    GetUser,
    UpdateUserRole,
    UpdateUserFields,
}

struct RouteDef {
    method: Method,
    pattern: &'static str,
    endpoint: Endpoint,
}

const fn route(method: Method, pattern: &'static str, endpoint: Endpoint) -> RouteDef {
    RouteDef {
        method,
        pattern,
        endpoint,
    }
}

static ROUTES: [RouteDef; 19] = [
    route(Method::GET, "/", Endpoint::Root),
    route(Method::GET, "/health", Endpoint::Health),
    route(Method::GET, "/all-college", Endpoint::ListColleges),
    route(Method::GET, "/all-searched-college", Endpoint::SearchColleges),
    route(Method::GET, "/college/:id", Endpoint::GetCollege),
    route(Method::POST, "/colleges", Endpoint::CreateCollege),
    route(Method::DELETE, "/colleges/:id", Endpoint::DeleteCollege),
    route(Method::POST, "/admission", Endpoint::CreateAdmission),
    route(Method::GET, "/admissions", Endpoint::ListAdmissions),
    route(Method::GET, "/admin/admissions", Endpoint::ListAllAdmissions),
    route(Method::PATCH, "/admin/admission/:id", Endpoint::SetAdmissionStatus),
    route(Method::DELETE, "/admin/admission/:id", Endpoint::DeleteAdmission),
    route(Method::POST, "/review", Endpoint::CreateReview),
    route(Method::GET, "/reviews", Endpoint::ListReviews),
    route(Method::POST, "/users", Endpoint::CreateUser),
    route(Method::GET, "/users", Endpoint::ListUsers),
    route(Method::GET, "/users/:key", Endpoint::GetUser),
    route(Method::PATCH, "/users/:id", Endpoint::UpdateUserRole),
    route(Method::PUT, "/users/:email", Endpoint::UpdateUserFields),
];

/// Outcome of looking a request up in the route table
#[derive(Debug, PartialEq, Eq)]
pub enum Resolution<'a> {
    Matched(Endpoint, PathParams<'a>),
    /// Path exists, method does not; carries the accepted methods
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

/// Resolve a request to an endpoint
///
/// `HEAD` is answered by the matching `GET` route.
pub fn resolve<'a>(method: &Method, path: &'a str) -> Resolution<'a> {
    let lookup = if *method == Method::HEAD {
        &Method::GET
    } else {
        method
    };

    let mut allowed = Vec::new();
    for def in &ROUTES {
        if let Some(params) = match_path(def.pattern, path) {
            if def.method == *lookup {
                return Resolution::Matched(def.endpoint, params);
            }
            if !allowed.contains(&def.method) {
                allowed.push(def.method.clone());
            }
        }
    }

    if allowed.is_empty() {
        Resolution::NotFound
    } else {
        Resolution::MethodNotAllowed(allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(method: &Method, path: &str) -> Option<Endpoint> {
        match resolve(method, path) {
            Resolution::Matched(endpoint, _) => Some(endpoint),
            _ => None,
        }
    }

    #[test]
    fn test_resolve_collection_routes() {
        assert_eq!(endpoint(&Method::GET, "/all-college"), Some(Endpoint::ListColleges));
        assert_eq!(endpoint(&Method::POST, "/colleges"), Some(Endpoint::CreateCollege));
        assert_eq!(endpoint(&Method::GET, "/reviews"), Some(Endpoint::ListReviews));
        assert_eq!(
            endpoint(&Method::GET, "/admin/admissions"),
            Some(Endpoint::ListAllAdmissions)
        );
    }

    #[test]
    fn test_resolve_user_routes_by_method() {
        assert_eq!(endpoint(&Method::GET, "/users/abc"), Some(Endpoint::GetUser));
        assert_eq!(endpoint(&Method::PATCH, "/users/abc"), Some(Endpoint::UpdateUserRole));
        assert_eq!(
            endpoint(&Method::PUT, "/users/a@b.c"),
            Some(Endpoint::UpdateUserFields)
        );
    }

    #[test]
    fn test_resolve_params() {
        match resolve(&Method::DELETE, "/admin/admission/42") {
            Resolution::Matched(Endpoint::DeleteAdmission, params) => {
                assert_eq!(params.get("id"), Some("42"));
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn test_head_uses_get_route() {
        assert_eq!(endpoint(&Method::HEAD, "/"), Some(Endpoint::Root));
    }

    #[test]
    fn test_method_not_allowed() {
        assert_eq!(
            resolve(&Method::POST, "/college/1"),
            Resolution::MethodNotAllowed(vec![Method::GET])
        );
        assert_eq!(
            resolve(&Method::DELETE, "/users"),
            Resolution::MethodNotAllowed(vec![Method::POST, Method::GET])
        );
    }

    #[test]
    fn test_not_found() {
        assert_eq!(resolve(&Method::GET, "/nope"), Resolution::NotFound);
        assert_eq!(resolve(&Method::GET, "/college"), Resolution::NotFound);
    }
}
