use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::LazyLock;

use pixela_core::PixelaClient;
use pixela_core::types::{
    CreateGraphRequest, CreateUserRequest, CreateWebhookRequest, GraphSvgQuery, Listing,
    PixelsQuery, PostPixelRequest, UpdateGraphRequest, UpdatePixelRequest,
    UpdateUserProfileRequest, UpdateUserRequest, WebhookType,
};
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::args::{ToolArgs, today};
use crate::envelope::ToolOutput;
use crate::error::{ToolError, accepted};

pub type ToolFuture<'a> = Pin<Box<dyn Future<Output = Result<ToolOutput, ToolError>> + Send + 'a>>;
type ToolHandler = for<'a> fn(&'a PixelaClient, ToolArgs<'a>) -> ToolFuture<'a>;

pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
    handler: ToolHandler,
}

impl std::fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

static TOOLS: LazyLock<Vec<ToolDefinition>> = LazyLock::new(tool_definitions);
static TOOL_INDEX: LazyLock<HashMap<&'static str, usize>> = LazyLock::new(|| {
    TOOLS
        .iter()
        .enumerate()
        .map(|(index, tool)| (tool.name, index))
        .collect()
});

/// The fixed tool catalog, in `tools/list` order.
pub fn tool_catalog() -> &'static [ToolDefinition] {
    &TOOLS
}

pub fn find_tool(name: &str) -> Option<&'static ToolDefinition> {
    TOOL_INDEX.get(name).map(|index| &TOOLS[*index])
}

/// Extract, call, format. Extraction errors return before any network call.
pub async fn dispatch(
    client: &PixelaClient,
    name: &str,
    arguments: &Map<String, Value>,
) -> Result<ToolOutput, ToolError> {
    let tool = find_tool(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
    (tool.handler)(client, ToolArgs::new(arguments)).await
}

// ---------------------------------------------------------------------------
// Schemas
// ---------------------------------------------------------------------------

fn text(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn with_common(mut extra: Value, graph: bool) -> Value {
    if let Some(map) = extra.as_object_mut() {
        map.insert("username".into(), text("User name"));
        map.insert("token".into(), text("Authentication token (X-USER-TOKEN)"));
        if graph {
            map.insert("graphID".into(), text("Graph ID"));
        }
    }
    extra
}

fn graph_schema(extra: Value, required_extra: &[&str]) -> Value {
    let mut required = vec!["username", "token", "graphID"];
    required.extend_from_slice(required_extra);
    object_schema(with_common(extra, true), &required)
}

fn user_schema(extra: Value, required_extra: &[&str]) -> Value {
    let mut required = vec!["username", "token"];
    required.extend_from_slice(required_extra);
    object_schema(with_common(extra, false), &required)
}

fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "create_user",
            description: "Create a user on Pixela",
            input_schema: user_schema(
                json!({
                    "agreeTermsOfService": text("Agreement to the terms of service (yes/no)"),
                    "notMinor": text("Confirmation of not being a minor (yes/no)"),
                }),
                &["agreeTermsOfService", "notMinor"],
            ),
            handler: create_user,
        },
        ToolDefinition {
            name: "create_graph",
            description: "Create a graph on Pixela",
            input_schema: graph_schema(
                json!({
                    "name": text("Graph name"),
                    "unit": text("Unit of the quantity"),
                    "type": text("Graph type (int/float)"),
                    "color": text("Graph color (shibafu/momiji/sora/ichou/ajisai/kuro)"),
                    "timezone": text("Time zone of the graph, e.g. Asia/Tokyo"),
                    "selfSufficient": text("Self-sufficient mode (increment/decrement/none)"),
                    "isSecret": text("Hide the graph from public listings (true/false)"),
                    "publishOptionalData": text("Publish pixel optionalData (true/false)"),
                }),
                &["name", "unit", "type", "color"],
            ),
            handler: create_graph,
        },
        ToolDefinition {
            name: "post_pixel",
            description: "Post a pixel to Pixela",
            input_schema: graph_schema(
                json!({
                    "date": text("Date (yyyyMMdd). Defaults to today"),
                    "quantity": text("Quantity"),
                    "optionalData": text("Additional data as a JSON string"),
                }),
                &["quantity"],
            ),
            handler: post_pixel,
        },
        ToolDefinition {
            name: "delete_user",
            description: "Delete a user on Pixela",
            input_schema: user_schema(json!({}), &[]),
            handler: delete_user,
        },
        ToolDefinition {
            name: "update_user",
            description: "Update a user's authentication token on Pixela",
            input_schema: user_schema(
                json!({
                    "newToken": text("New authentication token"),
                    "thanksCode": text("Thanks code for supporters"),
                }),
                &["newToken"],
            ),
            handler: update_user,
        },
        ToolDefinition {
            name: "update_user_profile",
            description: "Update a user's public profile on Pixela",
            input_schema: user_schema(
                json!({
                    "displayName": text("Display name"),
                    "gravatarIconEmail": text("Email address registered with Gravatar"),
                    "title": text("Title shown on the profile page"),
                    "about": text("About text"),
                    "pixelaGraph": text("Graph ID shown on the profile page"),
                    "timezone": text("Time zone, e.g. Asia/Tokyo"),
                    "contributeURLs": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Contribution URLs"
                    },
                }),
                &[],
            ),
            handler: update_user_profile,
        },
        ToolDefinition {
            name: "get_graphs",
            description: "List the graph definitions of a user",
            input_schema: user_schema(json!({}), &[]),
            handler: get_graphs,
        },
        ToolDefinition {
            name: "get_graph_definition",
            description: "Get the definition of one graph",
            input_schema: graph_schema(json!({}), &[]),
            handler: get_graph_definition,
        },
        ToolDefinition {
            name: "update_graph",
            description: "Update the definition of a graph",
            input_schema: graph_schema(
                json!({
                    "name": text("Graph name"),
                    "unit": text("Unit of the quantity"),
                    "color": text("Graph color"),
                    "timezone": text("Time zone of the graph"),
                    "selfSufficient": text("Self-sufficient mode (increment/decrement/none)"),
                    "isSecret": text("Hide the graph from public listings (true/false)"),
                    "publishOptionalData": text("Publish pixel optionalData (true/false)"),
                }),
                &[],
            ),
            handler: update_graph,
        },
        ToolDefinition {
            name: "delete_graph",
            description: "Delete a graph",
            input_schema: graph_schema(json!({}), &[]),
            handler: delete_graph,
        },
        ToolDefinition {
            name: "get_pixels",
            description: "List the pixels of a graph",
            input_schema: graph_schema(
                json!({
                    "from": text("Start date (yyyyMMdd)"),
                    "to": text("End date (yyyyMMdd)"),
                    "withBody": text("Return quantity and optionalData too (true/false)"),
                }),
                &[],
            ),
            handler: get_pixels,
        },
        ToolDefinition {
            name: "get_graph_stats",
            description: "Get summary statistics of a graph",
            input_schema: graph_schema(json!({}), &[]),
            handler: get_graph_stats,
        },
        ToolDefinition {
            name: "batch_post_pixels",
            description: "Post several pixels to a graph in one call",
            input_schema: graph_schema(
                json!({
                    "pixels": {
                        "type": "array",
                        "description": "Pixels to record",
                        "items": {
                            "type": "object",
                            "properties": {
                                "date": text("Date (yyyyMMdd)"),
                                "quantity": text("Quantity"),
                                "optionalData": text("Additional data as a JSON string"),
                            },
                            "required": ["date", "quantity"]
                        }
                    },
                }),
                &["pixels"],
            ),
            handler: batch_post_pixels,
        },
        ToolDefinition {
            name: "get_pixel",
            description: "Get the pixel of a given date",
            input_schema: graph_schema(json!({ "date": text("Date (yyyyMMdd)") }), &["date"]),
            handler: get_pixel,
        },
        ToolDefinition {
            name: "get_latest_pixel",
            description: "Get the most recent pixel of a graph",
            input_schema: graph_schema(json!({}), &[]),
            handler: get_latest_pixel,
        },
        ToolDefinition {
            name: "get_today_pixel",
            description: "Get today's pixel of a graph",
            input_schema: graph_schema(
                json!({
                    "returnEmpty": text("Return a zero pixel instead of 404 when none exists (true/false)"),
                }),
                &[],
            ),
            handler: get_today_pixel,
        },
        ToolDefinition {
            name: "update_pixel",
            description: "Update the pixel of a given date",
            input_schema: graph_schema(
                json!({
                    "date": text("Date (yyyyMMdd)"),
                    "quantity": text("Quantity"),
                    "optionalData": text("Additional data as a JSON string"),
                }),
                &["date", "quantity"],
            ),
            handler: update_pixel,
        },
        ToolDefinition {
            name: "delete_pixel",
            description: "Delete the pixel of a given date",
            input_schema: graph_schema(json!({ "date": text("Date (yyyyMMdd)") }), &["date"]),
            handler: delete_pixel,
        },
        ToolDefinition {
            name: "increment_pixel",
            description: "Increment today's pixel by one",
            input_schema: graph_schema(json!({}), &[]),
            handler: increment_pixel,
        },
        ToolDefinition {
            name: "decrement_pixel",
            description: "Decrement today's pixel by one",
            input_schema: graph_schema(json!({}), &[]),
            handler: decrement_pixel,
        },
        ToolDefinition {
            name: "add_pixel",
            description: "Add a quantity to today's pixel",
            input_schema: graph_schema(json!({ "quantity": text("Quantity to add") }), &["quantity"]),
            handler: add_pixel,
        },
        ToolDefinition {
            name: "subtract_pixel",
            description: "Subtract a quantity from today's pixel",
            input_schema: graph_schema(
                json!({ "quantity": text("Quantity to subtract") }),
                &["quantity"],
            ),
            handler: subtract_pixel,
        },
        ToolDefinition {
            name: "stopwatch",
            description: "Start the graph's stopwatch, or stop it and record the elapsed minutes",
            input_schema: graph_schema(json!({}), &[]),
            handler: stopwatch,
        },
        ToolDefinition {
            name: "get_graph_svg",
            description: "Render a graph as SVG (public graphs only, no token needed)",
            input_schema: object_schema(
                json!({
                    "username": text("User name"),
                    "graphID": text("Graph ID"),
                    "date": text("Last date shown (yyyyMMdd)"),
                    "mode": text("Display mode (short/badge/line)"),
                }),
                &["username", "graphID"],
            ),
            handler: get_graph_svg,
        },
        ToolDefinition {
            name: "create_webhook",
            description: "Create a webhook that increments or decrements a graph",
            input_schema: user_schema(
                json!({
                    "graphID": text("Graph ID"),
                    "type": text("Webhook type (increment/decrement)"),
                    "quantity": text("Quantity applied per invocation"),
                }),
                &["graphID", "type"],
            ),
            handler: create_webhook,
        },
        ToolDefinition {
            name: "get_webhooks",
            description: "List the webhooks of a user",
            input_schema: user_schema(json!({}), &[]),
            handler: get_webhooks,
        },
        ToolDefinition {
            name: "invoke_webhook",
            description: "Invoke a webhook (no token needed)",
            input_schema: object_schema(
                json!({
                    "username": text("User name"),
                    "webhookHash": text("Webhook hash"),
                }),
                &["username", "webhookHash"],
            ),
            handler: invoke_webhook,
        },
        ToolDefinition {
            name: "delete_webhook",
            description: "Delete a webhook",
            input_schema: user_schema(
                json!({ "webhookHash": text("Webhook hash") }),
                &["webhookHash"],
            ),
            handler: delete_webhook,
        },
    ]
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

struct Account<'a> {
    username: &'a str,
    token: &'a str,
}

fn account<'a>(args: &ToolArgs<'a>) -> Result<Account<'a>, ToolError> {
    Ok(Account {
        username: args.required("username")?,
        token: args.required("token")?,
    })
}

struct GraphRef<'a> {
    username: &'a str,
    token: &'a str,
    graph_id: &'a str,
}

fn graph_ref<'a>(args: &ToolArgs<'a>) -> Result<GraphRef<'a>, ToolError> {
    Ok(GraphRef {
        username: args.required("username")?,
        token: args.required("token")?,
        graph_id: args.required("graphID")?,
    })
}

fn to_data<T: Serialize>(value: &T) -> Result<Value, ToolError> {
    Ok(serde_json::to_value(value)?)
}

fn create_user<'a>(client: &'a PixelaClient, args: ToolArgs<'a>) -> ToolFuture<'a> {
    Box::pin(async move {
        const ACTION: &str = "create user";
        let request = CreateUserRequest {
            username: args.required_owned("username")?,
            token: args.required_owned("token")?,
            agree_terms_of_service: args.required_owned("agreeTermsOfService")?,
            not_minor: args.required_owned("notMinor")?,
        };
        let response = client
            .create_user(&request)
            .await
            .map_err(ToolError::client(ACTION))?;
        accepted(ACTION, response)?;
        Ok(ToolOutput::message(format!(
            "User '{}' created",
            request.username
        )))
    })
}

fn create_graph<'a>(client: &'a PixelaClient, args: ToolArgs<'a>) -> ToolFuture<'a> {
    Box::pin(async move {
        const ACTION: &str = "create graph";
        let target = graph_ref(&args)?;
        let request = CreateGraphRequest {
            id: target.graph_id.to_string(),
            name: args.required_owned("name")?,
            unit: args.required_owned("unit")?,
            graph_type: args.required_owned("type")?,
            color: args.required_owned("color")?,
            timezone: args.optional_owned("timezone"),
            self_sufficient: args.optional_owned("selfSufficient"),
            is_secret: args.optional_owned("isSecret"),
            publish_optional_data: args.optional_owned("publishOptionalData"),
        };
        let response = client
            .create_graph(target.username, target.token, &request)
            .await
            .map_err(ToolError::client(ACTION))?;
        accepted(ACTION, response)?;
        Ok(ToolOutput::message(format!(
            "Graph '{}' ({}) created",
            request.id, request.name
        )))
    })
}

fn post_pixel<'a>(client: &'a PixelaClient, args: ToolArgs<'a>) -> ToolFuture<'a> {
    Box::pin(async move {
        const ACTION: &str = "post pixel";
        let target = graph_ref(&args)?;
        let request = PostPixelRequest {
            quantity: args.required_owned("quantity")?,
            date: args.date_or_today("date"),
            optional_data: args.optional_owned("optionalData"),
        };
        let response = client
            .post_pixel(target.username, target.token, target.graph_id, &request)
            .await
            .map_err(ToolError::client(ACTION))?;
        accepted(ACTION, response)?;
        Ok(ToolOutput::message(format!(
            "Pixel posted to graph '{}' (date: {}, quantity: {})",
            target.graph_id, request.date, request.quantity
        )))
    })
}

fn delete_user<'a>(client: &'a PixelaClient, args: ToolArgs<'a>) -> ToolFuture<'a> {
    Box::pin(async move {
        const ACTION: &str = "delete user";
        let account = account(&args)?;
        let response = client
            .delete_user(account.username, account.token)
            .await
            .map_err(ToolError::client(ACTION))?;
        accepted(ACTION, response)?;
        Ok(ToolOutput::message(format!(
            "User '{}' deleted",
            account.username
        )))
    })
}

fn update_user<'a>(client: &'a PixelaClient, args: ToolArgs<'a>) -> ToolFuture<'a> {
    Box::pin(async move {
        const ACTION: &str = "update user";
        let account = account(&args)?;
        let request = UpdateUserRequest {
            new_token: args.required_owned("newToken")?,
            thanks_code: args.optional_owned("thanksCode"),
        };
        let response = client
            .update_user(account.username, account.token, &request)
            .await
            .map_err(ToolError::client(ACTION))?;
        accepted(ACTION, response)?;
        Ok(ToolOutput::message(format!(
            "User '{}' updated",
            account.username
        )))
    })
}

fn update_user_profile<'a>(client: &'a PixelaClient, args: ToolArgs<'a>) -> ToolFuture<'a> {
    Box::pin(async move {
        const ACTION: &str = "update user profile";
        let account = account(&args)?;
        let request = UpdateUserProfileRequest {
            display_name: args.optional_owned("displayName"),
            gravatar_icon_email: args.optional_owned("gravatarIconEmail"),
            title: args.optional_owned("title"),
            about: args.optional_owned("about"),
            pixela_graph: args.optional_owned("pixelaGraph"),
            timezone: args.optional_owned("timezone"),
            contribute_urls: args.string_list("contributeURLs"),
        };
        let response = client
            .update_user_profile(account.username, account.token, &request)
            .await
            .map_err(ToolError::client(ACTION))?;
        accepted(ACTION, response)?;
        Ok(ToolOutput::message(format!(
            "Profile of user '{}' updated",
            account.username
        )))
    })
}

fn get_graphs<'a>(client: &'a PixelaClient, args: ToolArgs<'a>) -> ToolFuture<'a> {
    Box::pin(async move {
        let account = account(&args)?;
        let graphs = client
            .get_graphs(account.username, account.token)
            .await
            .map_err(ToolError::client("get graphs"))?;
        if graphs.is_empty() {
            return Ok(ToolOutput::message(format!(
                "No graphs found for user '{}'",
                account.username
            )));
        }

        let (lines, data): (Vec<String>, Vec<Value>) = match &graphs {
            Listing::Names(ids) => ids
                .iter()
                .map(|id| (format!("ID: {id}"), json!({ "id": id })))
                .unzip(),
            Listing::Details(details) => {
                let mut lines = Vec::with_capacity(details.len());
                let mut data = Vec::with_capacity(details.len());
                for graph in details {
                    lines.push(format!(
                        "ID: {}, name: {}, unit: {}, type: {}, color: {}",
                        graph.id, graph.name, graph.unit, graph.graph_type, graph.color
                    ));
                    data.push(to_data(graph)?);
                }
                (lines, data)
            }
        };
        Ok(ToolOutput::with_data(
            format!(
                "Graphs of user '{}' ({}):\n{}",
                account.username,
                graphs.len(),
                lines.join("\n")
            ),
            Value::Array(data),
        ))
    })
}

fn get_graph_definition<'a>(client: &'a PixelaClient, args: ToolArgs<'a>) -> ToolFuture<'a> {
    Box::pin(async move {
        let target = graph_ref(&args)?;
        let graph = client
            .get_graph_definition(target.username, target.token, target.graph_id)
            .await
            .map_err(ToolError::client("get graph definition"))?;
        Ok(ToolOutput::with_data(
            format!("Fetched definition of graph '{}' ({})", target.graph_id, graph.name),
            to_data(&graph)?,
        ))
    })
}

fn update_graph<'a>(client: &'a PixelaClient, args: ToolArgs<'a>) -> ToolFuture<'a> {
    Box::pin(async move {
        const ACTION: &str = "update graph";
        let target = graph_ref(&args)?;
        let request = UpdateGraphRequest {
            name: args.optional_owned("name"),
            unit: args.optional_owned("unit"),
            color: args.optional_owned("color"),
            timezone: args.optional_owned("timezone"),
            self_sufficient: args.optional_owned("selfSufficient"),
            is_secret: args.optional_owned("isSecret"),
            publish_optional_data: args.optional_owned("publishOptionalData"),
        };
        let response = client
            .update_graph(target.username, target.token, target.graph_id, &request)
            .await
            .map_err(ToolError::client(ACTION))?;
        accepted(ACTION, response)?;
        Ok(ToolOutput::message(format!(
            "Graph '{}' updated",
            target.graph_id
        )))
    })
}

fn delete_graph<'a>(client: &'a PixelaClient, args: ToolArgs<'a>) -> ToolFuture<'a> {
    Box::pin(async move {
        const ACTION: &str = "delete graph";
        let target = graph_ref(&args)?;
        let response = client
            .delete_graph(target.username, target.token, target.graph_id)
            .await
            .map_err(ToolError::client(ACTION))?;
        accepted(ACTION, response)?;
        Ok(ToolOutput::message(format!(
            "Graph '{}' deleted",
            target.graph_id
        )))
    })
}

fn get_pixels<'a>(client: &'a PixelaClient, args: ToolArgs<'a>) -> ToolFuture<'a> {
    Box::pin(async move {
        let target = graph_ref(&args)?;
        let query = PixelsQuery {
            from: args.optional_owned("from"),
            to: args.optional_owned("to"),
            with_body: args.optional_flag("withBody"),
        };
        let pixels = client
            .get_pixels(target.username, target.token, target.graph_id, &query)
            .await
            .map_err(ToolError::client("get pixels"))?;
        if pixels.is_empty() {
            return Ok(ToolOutput::message(format!(
                "Graph '{}' has no pixels",
                target.graph_id
            )));
        }

        Ok(match pixels {
            Listing::Names(dates) => ToolOutput::with_data(
                format!(
                    "Fetched {} pixel dates of graph '{}'",
                    dates.len(),
                    target.graph_id
                ),
                dates.iter().map(|date| json!({ "date": date })).collect(),
            ),
            Listing::Details(details) => ToolOutput::with_data(
                format!(
                    "Fetched {} pixels with details of graph '{}'",
                    details.len(),
                    target.graph_id
                ),
                to_data(&details)?,
            ),
        })
    })
}

fn get_graph_stats<'a>(client: &'a PixelaClient, args: ToolArgs<'a>) -> ToolFuture<'a> {
    Box::pin(async move {
        let target = graph_ref(&args)?;
        let stats = client
            .get_graph_stats(target.username, target.token, target.graph_id)
            .await
            .map_err(ToolError::client("get graph stats"))?;
        Ok(ToolOutput::with_data(
            format!("Fetched stats of graph '{}'", target.graph_id),
            to_data(&stats)?,
        ))
    })
}

fn batch_post_pixels<'a>(client: &'a PixelaClient, args: ToolArgs<'a>) -> ToolFuture<'a> {
    Box::pin(async move {
        const ACTION: &str = "batch post pixels";
        let target = graph_ref(&args)?;
        let pixels = args.pixels("pixels")?;
        let response = client
            .batch_post_pixels(target.username, target.token, target.graph_id, &pixels)
            .await
            .map_err(ToolError::client(ACTION))?;
        accepted(ACTION, response)?;
        Ok(ToolOutput::message(format!(
            "{} pixels posted to graph '{}'",
            pixels.len(),
            target.graph_id
        )))
    })
}

fn get_pixel<'a>(client: &'a PixelaClient, args: ToolArgs<'a>) -> ToolFuture<'a> {
    Box::pin(async move {
        let target = graph_ref(&args)?;
        let date = args.required("date")?;
        let mut pixel = client
            .get_pixel(target.username, target.token, target.graph_id, date)
            .await
            .map_err(ToolError::client("get pixel"))?;
        if pixel.date.is_empty() {
            pixel.date = date.to_string();
        }
        Ok(ToolOutput::with_data(
            format!("Fetched pixel {} of graph '{}'", date, target.graph_id),
            to_data(&pixel)?,
        ))
    })
}

fn get_latest_pixel<'a>(client: &'a PixelaClient, args: ToolArgs<'a>) -> ToolFuture<'a> {
    Box::pin(async move {
        let target = graph_ref(&args)?;
        let pixel = client
            .get_latest_pixel(target.username, target.token, target.graph_id)
            .await
            .map_err(ToolError::client("get latest pixel"))?;
        Ok(ToolOutput::with_data(
            format!(
                "Fetched latest pixel of graph '{}' (date: {})",
                target.graph_id, pixel.date
            ),
            to_data(&pixel)?,
        ))
    })
}

fn get_today_pixel<'a>(client: &'a PixelaClient, args: ToolArgs<'a>) -> ToolFuture<'a> {
    Box::pin(async move {
        let target = graph_ref(&args)?;
        let mut pixel = client
            .get_today_pixel(
                target.username,
                target.token,
                target.graph_id,
                args.optional_flag("returnEmpty"),
            )
            .await
            .map_err(ToolError::client("get today's pixel"))?;
        if pixel.date.is_empty() {
            pixel.date = today();
        }
        Ok(ToolOutput::with_data(
            format!(
                "Fetched today's pixel of graph '{}' (date: {})",
                target.graph_id, pixel.date
            ),
            to_data(&pixel)?,
        ))
    })
}

fn update_pixel<'a>(client: &'a PixelaClient, args: ToolArgs<'a>) -> ToolFuture<'a> {
    Box::pin(async move {
        const ACTION: &str = "update pixel";
        let target = graph_ref(&args)?;
        let date = args.required("date")?;
        let request = UpdatePixelRequest {
            quantity: args.required_owned("quantity")?,
            optional_data: args.optional_owned("optionalData"),
        };
        let response = client
            .update_pixel(target.username, target.token, target.graph_id, date, &request)
            .await
            .map_err(ToolError::client(ACTION))?;
        accepted(ACTION, response)?;
        Ok(ToolOutput::message(format!(
            "Pixel {} of graph '{}' updated (quantity: {})",
            date, target.graph_id, request.quantity
        )))
    })
}

fn delete_pixel<'a>(client: &'a PixelaClient, args: ToolArgs<'a>) -> ToolFuture<'a> {
    Box::pin(async move {
        const ACTION: &str = "delete pixel";
        let target = graph_ref(&args)?;
        let date = args.required("date")?;
        let response = client
            .delete_pixel(target.username, target.token, target.graph_id, date)
            .await
            .map_err(ToolError::client(ACTION))?;
        accepted(ACTION, response)?;
        Ok(ToolOutput::message(format!(
            "Pixel {} of graph '{}' deleted",
            date, target.graph_id
        )))
    })
}

fn increment_pixel<'a>(client: &'a PixelaClient, args: ToolArgs<'a>) -> ToolFuture<'a> {
    Box::pin(async move {
        const ACTION: &str = "increment pixel";
        let target = graph_ref(&args)?;
        let response = client
            .increment_pixel(target.username, target.token, target.graph_id)
            .await
            .map_err(ToolError::client(ACTION))?;
        accepted(ACTION, response)?;
        Ok(ToolOutput::message(format!(
            "Today's pixel of graph '{}' incremented",
            target.graph_id
        )))
    })
}

fn decrement_pixel<'a>(client: &'a PixelaClient, args: ToolArgs<'a>) -> ToolFuture<'a> {
    Box::pin(async move {
        const ACTION: &str = "decrement pixel";
        let target = graph_ref(&args)?;
        let response = client
            .decrement_pixel(target.username, target.token, target.graph_id)
            .await
            .map_err(ToolError::client(ACTION))?;
        accepted(ACTION, response)?;
        Ok(ToolOutput::message(format!(
            "Today's pixel of graph '{}' decremented",
            target.graph_id
        )))
    })
}

fn add_pixel<'a>(client: &'a PixelaClient, args: ToolArgs<'a>) -> ToolFuture<'a> {
    Box::pin(async move {
        const ACTION: &str = "add pixel";
        let target = graph_ref(&args)?;
        let quantity = args.required("quantity")?;
        let response = client
            .add_pixel(target.username, target.token, target.graph_id, quantity)
            .await
            .map_err(ToolError::client(ACTION))?;
        accepted(ACTION, response)?;
        Ok(ToolOutput::message(format!(
            "Added {} to today's pixel of graph '{}'",
            quantity, target.graph_id
        )))
    })
}

fn subtract_pixel<'a>(client: &'a PixelaClient, args: ToolArgs<'a>) -> ToolFuture<'a> {
    Box::pin(async move {
        const ACTION: &str = "subtract pixel";
        let target = graph_ref(&args)?;
        let quantity = args.required("quantity")?;
        let response = client
            .subtract_pixel(target.username, target.token, target.graph_id, quantity)
            .await
            .map_err(ToolError::client(ACTION))?;
        accepted(ACTION, response)?;
        Ok(ToolOutput::message(format!(
            "Subtracted {} from today's pixel of graph '{}'",
            quantity, target.graph_id
        )))
    })
}

fn stopwatch<'a>(client: &'a PixelaClient, args: ToolArgs<'a>) -> ToolFuture<'a> {
    Box::pin(async move {
        const ACTION: &str = "stopwatch";
        let target = graph_ref(&args)?;
        let response = client
            .stopwatch(target.username, target.token, target.graph_id)
            .await
            .map_err(ToolError::client(ACTION))?;
        let response = accepted(ACTION, response)?;
        Ok(ToolOutput::message(format!(
            "Stopwatch of graph '{}': {}",
            target.graph_id, response.message
        )))
    })
}

fn get_graph_svg<'a>(client: &'a PixelaClient, args: ToolArgs<'a>) -> ToolFuture<'a> {
    Box::pin(async move {
        let username = args.required("username")?;
        let graph_id = args.required("graphID")?;
        let query = GraphSvgQuery {
            date: args.optional_owned("date"),
            mode: args.optional_owned("mode"),
        };
        let svg = client
            .get_graph_svg(username, graph_id, &query)
            .await
            .map_err(ToolError::client("get graph svg"))?;
        Ok(ToolOutput::message(format!(
            "SVG of graph '{graph_id}':\n{svg}"
        )))
    })
}

fn create_webhook<'a>(client: &'a PixelaClient, args: ToolArgs<'a>) -> ToolFuture<'a> {
    Box::pin(async move {
        const ACTION: &str = "create webhook";
        let account = account(&args)?;
        let graph_id = args.required("graphID")?;
        let raw_type = args.required("type")?;
        let webhook_type = WebhookType::parse(raw_type)
            .ok_or_else(|| ToolError::invalid("type", "must be 'increment' or 'decrement'"))?;
        let request = CreateWebhookRequest {
            graph_id: graph_id.to_string(),
            webhook_type,
            quantity: args.optional_owned("quantity"),
        };
        let response = client
            .create_webhook(account.username, account.token, &request)
            .await
            .map_err(ToolError::client(ACTION))?;
        let response = accepted(ACTION, response)?;
        let message = format!(
            "Webhook ({}) created for graph '{}'",
            webhook_type.as_str(),
            graph_id
        );
        Ok(match response.webhook_hash {
            Some(hash) => ToolOutput::with_data(
                message,
                json!({
                    "webhookHash": hash,
                    "graphID": graph_id,
                    "type": webhook_type.as_str(),
                }),
            ),
            None => ToolOutput::message(message),
        })
    })
}

fn get_webhooks<'a>(client: &'a PixelaClient, args: ToolArgs<'a>) -> ToolFuture<'a> {
    Box::pin(async move {
        let account = account(&args)?;
        let list = client
            .get_webhooks(account.username, account.token)
            .await
            .map_err(ToolError::client("get webhooks"))?;
        if list.webhooks.is_empty() {
            return Ok(ToolOutput::message(format!(
                "No webhooks registered for user '{}'",
                account.username
            )));
        }
        Ok(ToolOutput::with_data(
            format!(
                "Fetched {} webhooks of user '{}'",
                list.webhooks.len(),
                account.username
            ),
            to_data(&list.webhooks)?,
        ))
    })
}

fn invoke_webhook<'a>(client: &'a PixelaClient, args: ToolArgs<'a>) -> ToolFuture<'a> {
    Box::pin(async move {
        const ACTION: &str = "invoke webhook";
        let username = args.required("username")?;
        let hash = args.required("webhookHash")?;
        let response = client
            .invoke_webhook(username, hash)
            .await
            .map_err(ToolError::client(ACTION))?;
        accepted(ACTION, response)?;
        Ok(ToolOutput::message(format!("Webhook '{hash}' invoked")))
    })
}

fn delete_webhook<'a>(client: &'a PixelaClient, args: ToolArgs<'a>) -> ToolFuture<'a> {
    Box::pin(async move {
        const ACTION: &str = "delete webhook";
        let account = account(&args)?;
        let hash = args.required("webhookHash")?;
        let response = client
            .delete_webhook(account.username, account.token, hash)
            .await
            .map_err(ToolError::client(ACTION))?;
        accepted(ACTION, response)?;
        Ok(ToolOutput::message(format!("Webhook '{hash}' deleted")))
    })
}
