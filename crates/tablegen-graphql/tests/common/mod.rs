//! Introspection payloads shared by the integration tests.

#![allow(dead_code)]

use serde_json::{Value, json};

pub fn named(kind: &str, name: &str) -> Value {
    json!({ "kind": kind, "name": name, "ofType": null })
}

pub fn non_null(inner: Value) -> Value {
    json!({ "kind": "NON_NULL", "name": null, "ofType": inner })
}

pub fn list(inner: Value) -> Value {
    json!({ "kind": "LIST", "name": null, "ofType": inner })
}

pub fn field(name: &str, type_ref: Value) -> Value {
    json!({ "name": name, "type": type_ref, "args": [] })
}

pub fn object(name: &str, fields: Vec<Value>) -> Value {
    json!({ "name": name, "kind": "OBJECT", "fields": fields })
}

pub fn scalar_type(name: &str) -> Value {
    json!({ "name": name, "kind": "SCALAR", "fields": null })
}

/// `listWidgets { data: [Widget] }`, `Widget { id: ID!, name: String, parent: Widget }`.
pub fn widget_schema() -> Value {
    json!({
        "data": {
            "__schema": {
                "queryType": {
                    "name": "Query",
                    "fields": [
                        field("listWidgets", non_null(named("OBJECT", "WidgetPage"))),
                        field("getWidget", named("OBJECT", "Widget")),
                        field("ListLegacy", named("OBJECT", "WidgetPage")),
                        field("listInvoices", named("OBJECT", "InvoicePage")),
                    ]
                },
                "types": [
                    object("WidgetPage", vec![
                        field("data", list(named("OBJECT", "Widget"))),
                        field("totalCount", named("SCALAR", "Int")),
                    ]),
                    object("Widget", vec![
                        field("id", non_null(named("SCALAR", "ID"))),
                        field("name", named("SCALAR", "String")),
                        field("parent", named("OBJECT", "Widget")),
                    ]),
                    object("InvoicePage", vec![
                        field("data", non_null(list(non_null(named("OBJECT", "Invoice"))))),
                    ]),
                    object("Invoice", vec![
                        field("id", non_null(named("SCALAR", "ID"))),
                        field("status", named("ENUM", "InvoiceStatus")),
                        field("__typename", non_null(named("SCALAR", "String"))),
                        field("customer", named("OBJECT", "Customer")),
                    ]),
                    object("Customer", vec![
                        field("name", named("SCALAR", "String")),
                        field("invoices", list(named("OBJECT", "Invoice"))),
                    ]),
                    { "name": "InvoiceStatus", "kind": "ENUM", "fields": null },
                    scalar_type("ID"),
                    scalar_type("String"),
                    scalar_type("Int"),
                ]
            }
        }
    })
}

/// `listNodes { data: [Node0] }` over `count` object types where every
/// `NodeI` has an `id` and a field `nodeJ: NodeJ` for each type, itself included.
pub fn connected_schema(count: usize) -> Value {
    let node_fields: Vec<Value> = std::iter::once(field("id", non_null(named("SCALAR", "ID"))))
        .chain((0..count).map(|j| field(&format!("node{j}"), named("OBJECT", &format!("Node{j}")))))
        .collect();
    let mut types: Vec<Value> = (0..count)
        .map(|i| object(&format!("Node{i}"), node_fields.clone()))
        .collect();
    types.push(object("NodePage", vec![field("data", list(named("OBJECT", "Node0")))]));
    types.push(scalar_type("ID"));

    json!({
        "data": {
            "__schema": {
                "queryType": {
                    "name": "Query",
                    "fields": [field("listNodes", named("OBJECT", "NodePage"))]
                },
                "types": types,
            }
        }
    })
}
