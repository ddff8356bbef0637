//! Write the TypeScript declarations of every API type to `shared/types.ts`.

use std::{fs, path::PathBuf};

use anyhow::Context;
use db::models::{
    category::Category,
    client::{Client, Gender, SalesChannel},
    order::{Currency, Order, OrderItem, OrderWithItems},
    product::{Product, ProductSales},
    product_equivalence::EquivalentProduct,
};
use services::services::{
    clients::{ClientQuery, ClientStats, CurrencyTotal},
    orders::{OrderLineView, OrderQuery, OrderStats},
    products::{EquivalenceLink, ProductQuery},
    recommendation::{Recommendation, RecommendationRequest},
    validation::{
        CreateCategory, CreateClient, CreateEquivalence, CreateOrder, CreateProduct,
        OrderItemInput, UpdateClient, UpdateOrder, UpdateProduct,
    },
};
use ts_rs::TS;
use utils::response::{DeletedBody, ErrorBody, HealthBody};

fn generate_types_content() -> String {
    let decls = [
        Gender::decl(),
        SalesChannel::decl(),
        Currency::decl(),
        Client::decl(),
        Category::decl(),
        Product::decl(),
        ProductSales::decl(),
        EquivalentProduct::decl(),
        Order::decl(),
        OrderItem::decl(),
        OrderWithItems::decl(),
        CreateClient::decl(),
        UpdateClient::decl(),
        ClientQuery::decl(),
        ClientStats::decl(),
        CurrencyTotal::decl(),
        CreateCategory::decl(),
        CreateProduct::decl(),
        UpdateProduct::decl(),
        ProductQuery::decl(),
        CreateEquivalence::decl(),
        EquivalenceLink::decl(),
        OrderItemInput::decl(),
        CreateOrder::decl(),
        UpdateOrder::decl(),
        OrderQuery::decl(),
        OrderLineView::decl(),
        OrderStats::decl(),
        RecommendationRequest::decl(),
        Recommendation::decl(),
        ErrorBody::decl(),
        DeletedBody::decl(),
        HealthBody::decl(),
    ];

    let mut content = String::from("// This file was generated by `generate_types`. Do not edit.\n\n");
    for decl in decls {
        content.push_str("export ");
        content.push_str(&decl);
        content.push_str("\n\n");
    }
    content
}

fn main() -> anyhow::Result<()> {
    let shared = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../shared");
    fs::create_dir_all(&shared).with_context(|| format!("failed to create {}", shared.display()))?;

    let path = shared.join("types.ts");
    fs::write(&path, generate_types_content())
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
