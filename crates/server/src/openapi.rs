use utoipa::openapi::path::{Operation, OperationBuilder, PathItem, PathItemType};
use utoipa::openapi::Response;
use utoipa::OpenApi;
use utoipa::ToSchema;

use crate::routes::RESOURCE_PATHS;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct RegisterRequest { pub email: String, pub name: String, pub password: String, pub role: Option<String> }

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct RefreshRequest { pub refresh_token: String }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::refresh,
        crate::routes::auth::logout,
        crate::routes::auth::me,
    ),
    components(schemas(HealthResponse, RegisterRequest, LoginRequest, RefreshRequest)),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "resources"),
        (name = "reports")
    )
)]
pub struct ApiDoc;

fn operation(tag: &str, summary: String, codes: &[(&str, &str)]) -> Operation {
    codes
        .iter()
        .fold(OperationBuilder::new().tag(tag).summary(Some(summary)), |op, (code, description)| {
            op.response(*code, Response::new(*description))
        })
        .build()
}

/// Annotated routes plus the generated CRUD and report routes of every resource.
pub fn document() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    for path in RESOURCE_PATHS {
        let mut collection = PathItem::new(PathItemType::Get, operation("resources", format!("List {path}"), &[("200", "OK")]));
        collection.operations.insert(
            PathItemType::Post,
            operation("resources", format!("Create in {path}"), &[("201", "Created"), ("400", "Validation Error"), ("404", "Reference Not Found"), ("409", "Conflict")]),
        );

        let mut item = PathItem::new(PathItemType::Get, operation("resources", format!("Get one of {path}"), &[("200", "OK"), ("404", "Not Found")]));
        item.operations.insert(
            PathItemType::Put,
            operation("resources", format!("Replace one of {path}"), &[("200", "OK"), ("400", "Validation Error"), ("404", "Not Found"), ("409", "Conflict")]),
        );
        item.operations.insert(
            PathItemType::Delete,
            operation("resources", format!("Delete one of {path}"), &[("204", "Deleted"), ("404", "Not Found"), ("409", "Conflict")]),
        );

        let report_all = PathItem::new(PathItemType::Get, operation("reports", format!("Export {path} as pdf or xlsx"), &[("200", "Document")]));
        let report_one = PathItem::new(PathItemType::Get, operation("reports", format!("Export one of {path}"), &[("200", "Document"), ("404", "Not Found")]));

        doc.paths.paths.insert(format!("/api/{path}"), collection);
        doc.paths.paths.insert(format!("/api/{path}/{{id}}"), item);
        doc.paths.paths.insert(format!("/api/reports/{path}"), report_all);
        doc.paths.paths.insert(format!("/api/reports/{path}/{{id}}"), report_one);
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_generated_resource_paths() {
        let doc = document();
        assert!(doc.paths.paths.contains_key("/auth/login"));
        assert!(doc.paths.paths.contains_key("/api/accounts"));
        assert!(doc.paths.paths.contains_key("/api/reports/shifts/{id}"));
    }
}
