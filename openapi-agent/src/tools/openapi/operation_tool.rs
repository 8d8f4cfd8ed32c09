//! One `BaseTool` per OpenAPI operation.
//!
//! The declaration is derived from the operation's parameters and request
//! body; execution turns the model's arguments back into an HTTP request.

use crate::tools::openapi::{AuthConfig, HeaderOrQuery, OpenApiSpec};
use crate::tools::{BaseTool, FunctionDeclaration, ToolContext, ToolResult};
use openapiv3::{
    Operation, Parameter, ParameterData, ParameterSchemaOrContent, PathItem, QueryStyle,
    ReferenceOr, Schema, SchemaKind, Type,
};
use reqwest::{Method, RequestBuilder};
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::sync::Arc;

/// Nested `$ref`s deeper than this are left as plain objects.
const MAX_REF_DEPTH: usize = 8;

/// Arguments sorted by where they go in the request.
#[derive(Debug, Default)]
struct RequestParts {
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
}

pub struct OpenApiOperationTool {
    operation_id: String,
    description: String,
    method: Method,
    path: String,
    spec: Arc<OpenApiSpec>,
    http_client: Arc<reqwest::Client>,
    auth: Option<AuthConfig>,
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Encodes a query argument per the parameter's `style`/`explode`.
///
/// Exploded arrays yield one pair per element, so the result is a list.
fn encode_query_param(
    name: &str,
    value: &Value,
    style: &QueryStyle,
    explode: bool,
) -> Vec<(String, String)> {
    match value {
        Value::Array(items) => {
            let values: Vec<String> = items.iter().map(value_to_string).collect();
            match (style, explode) {
                (QueryStyle::Form, true) => {
                    values.into_iter().map(|v| (name.to_string(), v)).collect()
                }
                (QueryStyle::SpaceDelimited, _) => vec![(name.to_string(), values.join(" "))],
                (QueryStyle::PipeDelimited, _) => vec![(name.to_string(), values.join("|"))],
                (QueryStyle::Form, false) | (QueryStyle::DeepObject, _) => {
                    vec![(name.to_string(), values.join(","))]
                }
            }
        }
        Value::Object(fields) if matches!(style, QueryStyle::DeepObject) => fields
            .iter()
            .map(|(key, val)| (format!("{name}[{key}]"), value_to_string(val)))
            .collect(),
        _ => vec![(name.to_string(), value_to_string(value))],
    }
}

fn encode_header_param(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(value_to_string)
            .collect::<Vec<_>>()
            .join(","),
        _ => value_to_string(value),
    }
}

/// RFC 3986 percent-encoding of everything but unreserved characters, so a
/// path argument can never change the shape of the URL.
fn percent_encode_path_param(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            _ => {
                let _ = write!(&mut encoded, "%{byte:02X}");
            }
        }
    }
    encoded
}

fn parameter_location(param: &Parameter) -> &'static str {
    match param {
        Parameter::Query { .. } => "query",
        Parameter::Header { .. } => "header",
        Parameter::Path { .. } => "path",
        Parameter::Cookie { .. } => "cookie",
    }
}

/// Path-level parameters merged under operation-level ones; the pair
/// `(name, location)` identifies a parameter. `$ref` entries resolve through
/// `components/parameters`.
fn merge_parameters<'a>(
    spec: &'a OpenApiSpec,
    path_item: &'a PathItem,
    operation: &'a Operation,
) -> Vec<&'a Parameter> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();

    for entry in operation.parameters.iter().chain(&path_item.parameters) {
        let param = match entry {
            ReferenceOr::Item(param) => param,
            ReferenceOr::Reference { reference } => match spec.resolve_parameter_ref(reference) {
                Some(param) => param,
                None => {
                    tracing::warn!(%reference, "skipping unresolvable parameter reference");
                    continue;
                }
            },
        };
        let key = (param.parameter_data_ref().name.clone(), parameter_location(param));
        if seen.insert(key) {
            merged.push(param);
        }
    }
    merged
}

/// Renders OpenAPI schemas as plain JSON Schema, inlining component refs.
struct SchemaConverter<'a> {
    spec: &'a OpenApiSpec,
}

impl SchemaConverter<'_> {
    fn reference(&self, reference: &str, depth: usize) -> Value {
        if depth >= MAX_REF_DEPTH {
            return json!({"type": "object"});
        }
        match self.spec.resolve_schema_ref(reference) {
            Some(schema) => self.schema(schema, depth + 1),
            None => json!({"type": "object"}),
        }
    }

    fn schema_or_ref(&self, schema: &ReferenceOr<Schema>, depth: usize) -> Value {
        match schema {
            ReferenceOr::Item(schema) => self.schema(schema, depth),
            ReferenceOr::Reference { reference } => self.reference(reference, depth),
        }
    }

    fn boxed_or_ref(&self, schema: &ReferenceOr<Box<Schema>>, depth: usize) -> Value {
        match schema {
            ReferenceOr::Item(schema) => self.schema(schema, depth),
            ReferenceOr::Reference { reference } => self.reference(reference, depth),
        }
    }

    fn schema(&self, schema: &Schema, depth: usize) -> Value {
        let mut out = match &schema.schema_kind {
            SchemaKind::Type(Type::String(string_type)) => {
                let mut out = json!({"type": "string"});
                let values: Vec<&str> = string_type
                    .enumeration
                    .iter()
                    .filter_map(|v| v.as_deref())
                    .collect();
                if !values.is_empty() {
                    out["enum"] = json!(values);
                }
                out
            }
            SchemaKind::Type(Type::Number(_)) => json!({"type": "number"}),
            SchemaKind::Type(Type::Integer(_)) => json!({"type": "integer"}),
            SchemaKind::Type(Type::Boolean(_)) => json!({"type": "boolean"}),
            SchemaKind::Type(Type::Array(array_type)) => {
                let mut out = json!({"type": "array"});
                if let Some(items) = &array_type.items {
                    out["items"] = self.boxed_or_ref(items, depth);
                }
                out
            }
            SchemaKind::Type(Type::Object(object_type)) => {
                let mut out = json!({"type": "object"});
                if !object_type.properties.is_empty() {
                    let properties: Map<String, Value> = object_type
                        .properties
                        .iter()
                        .map(|(name, prop)| (name.clone(), self.boxed_or_ref(prop, depth)))
                        .collect();
                    out["properties"] = Value::Object(properties);
                }
                if !object_type.required.is_empty() {
                    out["required"] = json!(object_type.required);
                }
                out
            }
            _ => json!({"type": "object"}),
        };

        if let Some(description) = &schema.schema_data.description {
            out["description"] = json!(description);
        }
        out
    }

    fn parameter(&self, data: &ParameterData) -> Value {
        let mut out = match &data.format {
            ParameterSchemaOrContent::Schema(schema) => self.schema_or_ref(schema, 0),
            ParameterSchemaOrContent::Content(_) => json!({"type": "object"}),
        };
        if out.get("description").is_none() {
            if let Some(description) = &data.description {
                out["description"] = json!(description);
            }
        }
        out
    }
}

impl OpenApiOperationTool {
    #[must_use]
    pub fn new(
        operation_id: String,
        description: String,
        method: Method,
        path: String,
        spec: Arc<OpenApiSpec>,
        http_client: Arc<reqwest::Client>,
        auth: Option<AuthConfig>,
    ) -> Self {
        Self {
            operation_id,
            description,
            method,
            path,
            spec,
            http_client,
            auth,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn find_operation(&self) -> Option<(&PathItem, &Operation)> {
        let ReferenceOr::Item(path_item) = self.spec.spec().paths.paths.get(&self.path)? else {
            return None;
        };
        let (_, operation) = path_item
            .iter()
            .find(|(method, _)| method.eq_ignore_ascii_case(self.method.as_str()))?;
        Some((path_item, operation))
    }

    /// Base URL joined with the path, placeholders replaced by encoded arguments.
    fn build_url(&self, args: &HashMap<String, Value>) -> String {
        let mut url = format!("{}{}", self.spec.base_url().trim_end_matches('/'), self.path);
        for (key, value) in args {
            let placeholder = format!("{{{key}}}");
            if url.contains(&placeholder) {
                url = url.replace(&placeholder, &percent_encode_path_param(&value_to_string(value)));
            }
        }
        url
    }

    fn request_parts(
        spec: &OpenApiSpec,
        path_item: &PathItem,
        operation: &Operation,
        args: &HashMap<String, Value>,
    ) -> RequestParts {
        let mut parts = RequestParts::default();

        for param in merge_parameters(spec, path_item, operation) {
            let data = param.parameter_data_ref();
            let Some(value) = args.get(&data.name) else {
                continue;
            };
            match param {
                Parameter::Query { style, .. } => {
                    let explode = data.explode.unwrap_or(true);
                    parts
                        .query
                        .extend(encode_query_param(&data.name, value, style, explode));
                }
                Parameter::Header { .. } => {
                    parts
                        .headers
                        .push((data.name.clone(), encode_header_param(value)));
                }
                Parameter::Cookie { .. } => {
                    parts
                        .cookies
                        .push((data.name.clone(), value_to_string(value)));
                }
                Parameter::Path { .. } => {}
            }
        }
        parts
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            None => request,
            Some(AuthConfig::Basic { username, password }) => {
                request.basic_auth(username, Some(password))
            }
            Some(AuthConfig::Bearer { token }) => request.bearer_auth(token),
            Some(AuthConfig::ApiKey {
                location: HeaderOrQuery::Header,
                name,
                value,
            }) => request.header(name.as_str(), value.as_str()),
            Some(AuthConfig::ApiKey {
                location: HeaderOrQuery::Query,
                name,
                value,
            }) => request.query(&[(name, value)]),
        }
    }

    fn body_schema(&self, operation: &Operation) -> Option<(Value, bool)> {
        let ReferenceOr::Item(body) = operation.request_body.as_ref()? else {
            return Some((json!({"type": "object", "description": "Request body"}), false));
        };
        let converter = SchemaConverter { spec: &self.spec };
        let mut schema = body
            .content
            .get("application/json")
            .or_else(|| body.content.values().next())
            .and_then(|media| media.schema.as_ref())
            .map_or_else(|| json!({"type": "object"}), |s| converter.schema_or_ref(s, 0));
        if schema.get("description").is_none() {
            schema["description"] =
                json!(body.description.as_deref().unwrap_or("Request body"));
        }
        Some((schema, body.required))
    }
}

#[async_trait::async_trait]
impl BaseTool for OpenApiOperationTool {
    fn name(&self) -> &str {
        &self.operation_id
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn declaration(&self) -> FunctionDeclaration {
        let mut properties = Map::new();
        let mut required = Vec::new();

        if let Some((path_item, operation)) = self.find_operation() {
            let converter = SchemaConverter { spec: &self.spec };
            for param in merge_parameters(&self.spec, path_item, operation) {
                let data = param.parameter_data_ref();
                properties.insert(data.name.clone(), converter.parameter(data));
                if data.required {
                    required.push(data.name.clone());
                }
            }

            if let Some((schema, body_required)) = self.body_schema(operation) {
                properties.insert("body".to_string(), schema);
                if body_required {
                    required.push("body".to_string());
                }
            }
        }

        FunctionDeclaration::new(
            self.operation_id.clone(),
            self.description.clone(),
            json!({
                "type": "object",
                "properties": properties,
                "required": required
            }),
        )
    }

    #[tracing::instrument(
        name = "openapi_tool",
        skip_all,
        fields(tool = %self.operation_id, method = %self.method, agent = context.agent_name())
    )]
    async fn run_async(&self, args: HashMap<String, Value>, context: &ToolContext<'_>) -> ToolResult {
        let Some((path_item, operation)) = self.find_operation() else {
            return ToolResult::error(format!(
                "Operation '{}' not found in OpenAPI spec",
                self.operation_id
            ));
        };

        let parts = Self::request_parts(&self.spec, path_item, operation, &args);
        let url = self.build_url(&args);
        tracing::debug!(%url, "calling API operation");

        let mut request = self.http_client.request(self.method.clone(), &url);
        if !parts.query.is_empty() {
            request = request.query(&parts.query);
        }
        for (name, value) in &parts.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if !parts.cookies.is_empty() {
            let cookie = parts
                .cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            request = request.header(reqwest::header::COOKIE, cookie);
        }
        request = self.apply_auth(request);

        if matches!(self.method, Method::POST | Method::PUT | Method::PATCH) {
            if let Some(body) = args.get("body") {
                request = request.json(body);
            }
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "API request failed");
                return ToolResult::error(format!("HTTP request failed: {e}"));
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return ToolResult::error(format!("Failed to read response body: {e}")),
        };

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "API returned an error status");
            return ToolResult::error(format!(
                "HTTP {} {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown"),
                text
            ));
        }

        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));
        ToolResult::success(json!({
            "status": status.as_u16(),
            "body": body,
        }))
    }
}
