//! OpenAPI 3.0 description of the running server, served at `/openapi.json`.

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{config::ServerConfig, routes::ServerState};

pub async fn openapi_document(State(state): State<ServerState>) -> Json<Value> {
    Json(build_document(&state.config))
}

/// Builds the document for the configured variant. Write operations carry the
/// `petstore_auth` requirement only when the server enforces it.
pub fn build_document(config: &ServerConfig) -> Value {
    let protected = config.variant.requires_auth();
    let write_security = if protected {
        json!([{ "petstore_auth": ["write:pets", "read:pets"] }])
    } else {
        json!([])
    };

    let mut pet_required = vec!["id", "name", "status"];
    if config.variant.requires_photo_urls() {
        pet_required.push("photoUrls");
    }

    let mut doc = json!({
        "openapi": "3.0.3",
        "info": {
            "title": if protected { "Enhanced Petstore API" } else { "Petstore API" },
            "description": "A simple API that demonstrates CRUD operations on pets.",
            "version": "1.0.1"
        },
        "servers": [{ "url": config.public_url }],
        "paths": {
            "/pet": {
                "post": {
                    "operationId": "addPet",
                    "summary": "Add a new pet to the store",
                    "security": write_security,
                    "requestBody": pet_body(),
                    "responses": {
                        "200": pet_response(),
                        "400": detail_response("Pet with this ID already exists")
                    }
                },
                "put": {
                    "operationId": "updatePet",
                    "summary": "Update an existing pet",
                    "security": write_security,
                    "requestBody": pet_body(),
                    "responses": {
                        "200": pet_response(),
                        "404": detail_response("Pet not found")
                    }
                }
            },
            "/pet/{petId}": {
                "get": {
                    "operationId": "getPetById",
                    "summary": "Find pet by ID",
                    "parameters": [{
                        "name": "petId",
                        "in": "path",
                        "required": true,
                        "description": "ID of pet to return",
                        "schema": { "type": "integer", "format": "int64" }
                    }],
                    "responses": {
                        "200": pet_response(),
                        "404": detail_response("Pet not found")
                    }
                }
            },
            "/store/inventory": {
                "get": {
                    "operationId": "getInventory",
                    "summary": "Returns pet inventories by status",
                    "responses": {
                        "200": {
                            "description": "Counts of pets per status",
                            "content": { "application/json": { "schema": {
                                "type": "object",
                                "additionalProperties": { "type": "integer", "format": "int32" }
                            }}}
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Category": {
                    "type": "object",
                    "required": ["id", "name"],
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "name": { "type": "string" }
                    }
                },
                "Tag": {
                    "type": "object",
                    "required": ["id", "name"],
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "name": { "type": "string" }
                    }
                },
                "Pet": {
                    "type": "object",
                    "required": pet_required,
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "name": { "type": "string", "example": "doggie" },
                        "category": { "$ref": "#/components/schemas/Category" },
                        "photoUrls": { "type": "array", "items": { "type": "string" } },
                        "tags": { "type": "array", "items": { "$ref": "#/components/schemas/Tag" } },
                        "status": { "type": "string", "enum": ["available", "pending", "sold"] }
                    }
                }
            }
        }
    });

    if protected {
        doc["components"]["securitySchemes"] = json!({
            "petstore_auth": {
                "type": "oauth2",
                "flows": {
                    "authorizationCode": {
                        "authorizationUrl": config.authorization_url(),
                        "tokenUrl": config.token_url(),
                        "scopes": {
                            "write:pets": "modify pets in your account",
                            "read:pets": "read your pets"
                        }
                    }
                }
            }
        });
    }

    doc
}

fn pet_body() -> Value {
    json!({
        "required": true,
        "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Pet" } } }
    })
}

fn pet_response() -> Value {
    json!({
        "description": "Successful operation",
        "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Pet" } } }
    })
}

fn detail_response(description: &str) -> Value {
    json!({ "description": description })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiVariant;

    #[test]
    fn test_basic_document_has_no_security() {
        let doc = build_document(&ServerConfig::new(ApiVariant::Basic));
        assert!(doc["components"].get("securitySchemes").is_none());
        assert_eq!(doc["paths"]["/pet"]["post"]["security"], json!([]));
        assert_eq!(doc["servers"][0]["url"], "http://127.0.0.1:8000");
    }

    #[test]
    fn test_oauth_document_advertises_flow() {
        let mut config = ServerConfig::new(ApiVariant::OAuth);
        config.public_url = "http://localhost:9999/".to_string();
        let doc = build_document(&config);

        let flow = &doc["components"]["securitySchemes"]["petstore_auth"]["flows"]["authorizationCode"];
        assert_eq!(flow["authorizationUrl"], "http://localhost:9999/oauth/authorize");
        assert_eq!(flow["tokenUrl"], "http://localhost:9999/oauth/token");
        assert_eq!(
            doc["paths"]["/pet"]["put"]["security"][0]["petstore_auth"],
            json!(["write:pets", "read:pets"])
        );
        assert!(doc["paths"]["/pet/{petId}"]["get"].get("security").is_none());
        assert!(doc["components"]["schemas"]["Pet"]["required"]
            .as_array()
            .unwrap()
            .contains(&json!("photoUrls")));
    }
}
