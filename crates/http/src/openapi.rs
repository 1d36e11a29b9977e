//! OpenAPI document assembled from module fragments.

use bookshelf_kernel::ModuleRegistry;
use serde_json::{json, Value};

const API_TITLE: &str = "Bookshelf API";
const API_VERSION: &str = "1.0.0";

/// Merge every module's `paths` and `components.schemas` into one document.
pub fn document(registry: &ModuleRegistry) -> Value {
    let mut doc = base_document();

    for module in registry.modules() {
        if let Some(fragment) = module.openapi() {
            merge_fragment(&mut doc, &fragment);
        }
    }

    doc
}

fn base_document() -> Value {
    json!({
        "openapi": "3.1.0",
        "info": {
            "title": API_TITLE,
            "version": API_VERSION,
            "description": "Record management for books"
        },
        "paths": {
            "/healthz": {
                "get": {
                    "summary": "Health check",
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": {"text/plain": {"schema": {"type": "string"}}}
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "ErrorResponse": {
                    "type": "object",
                    "properties": {
                        "error": {"type": "string"}
                    },
                    "required": ["error"]
                }
            }
        }
    })
}

fn merge_fragment(doc: &mut Value, fragment: &Value) {
    if let Some(paths) = fragment.get("paths").and_then(Value::as_object) {
        for (path, item) in paths {
            doc["paths"][path] = item.clone();
        }
    }

    if let Some(schemas) = fragment
        .pointer("/components/schemas")
        .and_then(Value::as_object)
    {
        for (name, schema) in schemas {
            doc["components"]["schemas"][name] = schema.clone();
        }
    }
}

/// Typed view of the document for Swagger UI. Falls back to a bare document
/// when a fragment does not fit the OpenAPI model.
pub fn to_openapi(document: &Value) -> utoipa::openapi::OpenApi {
    serde_json::from_value(document.clone()).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "merged OpenAPI document is invalid; serving bare document");
        utoipa::openapi::OpenApiBuilder::new()
            .info(
                utoipa::openapi::InfoBuilder::new()
                    .title(API_TITLE)
                    .version(API_VERSION)
                    .build(),
            )
            .build()
    })
}
