//! Pre-built schemas for common document classes.
//!
//! These are static data: ready-made extraction schemas for the document
//! types people feed the server most, plus the default classification
//! category set. Callers who need anything else supply their own schema or
//! let the schema-generation endpoint produce one.

use indexmap::IndexMap;

use super::{Category, ClassificationSchema, ExtractionSchema, FieldKind, FieldSpec};

fn string(description: &str) -> FieldSpec {
    FieldSpec::with_description(FieldKind::String, description)
}

fn number(description: &str) -> FieldSpec {
    FieldSpec::with_description(FieldKind::Number, description)
}

fn object(properties: IndexMap<String, FieldSpec>) -> FieldSpec {
    FieldSpec::new(FieldKind::Object(properties))
}

fn array_of(items: FieldSpec, description: &str) -> FieldSpec {
    FieldSpec::with_description(FieldKind::Array(Box::new(items)), description)
}

/// Extraction schema for invoices.
pub fn invoice() -> ExtractionSchema {
    let mut line_item = IndexMap::new();
    line_item.insert("description".to_string(), string("Description of the billed item"));
    line_item.insert("quantity".to_string(), number("Quantity of the item"));
    line_item.insert("unit_price".to_string(), number("Price per unit"));
    line_item.insert("amount".to_string(), number("Line total"));

    let mut properties = IndexMap::new();
    properties.insert("invoice_number".to_string(), string("Invoice identifier"));
    properties.insert("invoice_date".to_string(), string("Date the invoice was issued"));
    properties.insert("due_date".to_string(), string("Payment due date"));
    properties.insert("vendor_name".to_string(), string("Name of the issuing vendor"));
    properties.insert("vendor_address".to_string(), string("Address of the vendor"));
    properties.insert("customer_name".to_string(), string("Name of the billed customer"));
    properties.insert(
        "line_items".to_string(),
        array_of(object(line_item), "Individual billed items"),
    );
    properties.insert("subtotal".to_string(), number("Total before tax"));
    properties.insert("tax".to_string(), number("Tax amount"));
    properties.insert("total_amount".to_string(), number("Total amount due"));
    properties.insert("currency".to_string(), string("Currency code, e.g. USD"));

    ExtractionSchema::new("invoice", properties)
}

/// Extraction schema for retail receipts.
pub fn receipt() -> ExtractionSchema {
    let mut item = IndexMap::new();
    item.insert("name".to_string(), string("Purchased item name"));
    item.insert("quantity".to_string(), number("Quantity purchased"));
    item.insert("price".to_string(), number("Price for this line"));

    let mut properties = IndexMap::new();
    properties.insert("merchant_name".to_string(), string("Name of the merchant"));
    properties.insert("merchant_address".to_string(), string("Address of the merchant"));
    properties.insert("transaction_date".to_string(), string("Date of the transaction"));
    properties.insert("transaction_time".to_string(), string("Time of the transaction"));
    properties.insert("items".to_string(), array_of(object(item), "Purchased items"));
    properties.insert("subtotal".to_string(), number("Total before tax"));
    properties.insert("tax".to_string(), number("Tax amount"));
    properties.insert("total".to_string(), number("Total amount paid"));
    properties.insert(
        "payment_method".to_string(),
        string("How the transaction was paid, e.g. cash or card"),
    );

    ExtractionSchema::new("receipt", properties)
}

/// Extraction schema for business cards.
pub fn business_card() -> ExtractionSchema {
    let mut properties = IndexMap::new();
    properties.insert("name".to_string(), string("Person's full name"));
    properties.insert("title".to_string(), string("Job title"));
    properties.insert("company".to_string(), string("Company name"));
    properties.insert("email".to_string(), string("Email address"));
    properties.insert("phone".to_string(), string("Phone number"));
    properties.insert("address".to_string(), string("Postal address"));
    properties.insert("website".to_string(), string("Company or personal website"));

    ExtractionSchema::new("business_card", properties)
}

/// Extraction schema for contracts.
pub fn contract() -> ExtractionSchema {
    let mut party = IndexMap::new();
    party.insert("name".to_string(), string("Name of the contracting party"));
    party.insert("role".to_string(), string("Role in the agreement, e.g. buyer or seller"));

    let mut properties = IndexMap::new();
    properties.insert("title".to_string(), string("Title of the agreement"));
    properties.insert("parties".to_string(), array_of(object(party), "Contracting parties"));
    properties.insert("effective_date".to_string(), string("Date the agreement takes effect"));
    properties.insert("expiration_date".to_string(), string("Date the agreement ends"));
    properties.insert("governing_law".to_string(), string("Jurisdiction governing the agreement"));
    properties.insert("payment_terms".to_string(), string("Summary of the payment terms"));
    properties.insert(
        "termination_clause".to_string(),
        string("Summary of the termination conditions"),
    );

    ExtractionSchema::new("contract", properties)
}

/// Look up a pre-built extraction schema by document class name.
pub fn extraction_template(name: &str) -> Option<ExtractionSchema> {
    match name {
        "invoice" => Some(invoice()),
        "receipt" => Some(receipt()),
        "business_card" => Some(business_card()),
        "contract" => Some(contract()),
        _ => None,
    }
}

/// The default classification category set: 13 common document classes
/// ending in an `others` fallback.
pub fn default_classification() -> ClassificationSchema {
    ClassificationSchema::new(
        "document-classification",
        vec![
            Category::new("invoice", "A bill issued by a vendor requesting payment"),
            Category::new("receipt", "Proof of a completed payment or purchase"),
            Category::new("contract", "A legally binding agreement between parties"),
            Category::new("cv", "A curriculum vitae or resume"),
            Category::new("bank_statement", "A summary of account transactions from a bank"),
            Category::new("tax_document", "A tax return, withholding statement, or similar filing"),
            Category::new("business_card", "A card with a person's name and contact details"),
            Category::new("certificate", "A document certifying a fact, qualification, or award"),
            Category::new("application_form", "A form filled in to apply for something"),
            Category::new("letter", "Written correspondence"),
            Category::new("report", "A structured document presenting findings or analysis"),
            Category::new("presentation", "Slides prepared for presenting to an audience"),
            Category::new("others", "A document that fits none of the other categories"),
        ],
    )
}
