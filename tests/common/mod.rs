//! Entity fixtures shared by the integration tests.
#![allow(dead_code)]

use chrono::NaiveDateTime;
use docorm::prelude::*;
use tracing_subscriber::EnvFilter;

/// Routes library logs to the test harness; `RUST_LOG=docorm=debug` shows SQL.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub async fn memory_backend() -> Relational {
    init_tracing();
    Relational::connect(&BackendConfig::in_memory())
        .await
        .unwrap()
}

// ============================================================================
// Invoice
// ============================================================================

pub static INVOICE: TypeDoc = TypeDoc::new("billing", "Invoice")
    .doc(
        "/**
          * An issued invoice.
          *
          * @property int $id @id @generated_value
          * @property string $customer @length(64)
          * @property string $status @default(open)
          * @property float $total
          * @property bool $paid
          * @property DateTime $issued_at @nullable
          * @property array $lines @nullable
          */",
    )
    .uses(&[Use::Path {
        alias: "DateTime",
        path: "chrono::NaiveDateTime",
    }]);

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Invoice {
    pub id: Option<i64>,
    pub customer: String,
    pub status: String,
    pub total: f64,
    pub paid: bool,
    pub issued_at: Option<NaiveDateTime>,
    pub lines: Vec<Value>,
}

impl Entity for Invoice {
    fn type_doc() -> &'static TypeDoc {
        &INVOICE
    }

    fn property(&self, name: &str) -> Option<Value> {
        Some(match name {
            "id" => self.id.into(),
            "customer" => self.customer.clone().into(),
            "status" => self.status.clone().into(),
            "total" => self.total.into(),
            "paid" => self.paid.into(),
            "issued_at" => self.issued_at.into(),
            "lines" => Value::List(self.lines.clone()),
            _ => return None,
        })
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<(), TypeError> {
        match name {
            "id" => self.id = FromValue::from_value(name, value)?,
            "customer" => self.customer = FromValue::from_value(name, value)?,
            "status" => self.status = FromValue::from_value(name, value)?,
            "total" => self.total = FromValue::from_value(name, value)?,
            "paid" => self.paid = FromValue::from_value(name, value)?,
            "issued_at" => self.issued_at = FromValue::from_value(name, value)?,
            "lines" => {
                self.lines = Option::<Vec<Value>>::from_value(name, value)?.unwrap_or_default()
            }
            _ => return Err(TypeError::UnknownProperty(name.to_string())),
        }
        Ok(())
    }
}

// ============================================================================
// Customer / Order (entity references)
// ============================================================================

pub static CUSTOMER: TypeDoc = TypeDoc::new("shop", "Customer").doc(
    "@property int $id @id @generated_value
     @property string $name @required",
);

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Customer {
    pub id: Option<i64>,
    pub name: String,
}

impl Entity for Customer {
    fn type_doc() -> &'static TypeDoc {
        &CUSTOMER
    }

    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(self.id.into()),
            "name" => Some(self.name.clone().into()),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<(), TypeError> {
        match name {
            "id" => self.id = FromValue::from_value(name, value)?,
            "name" => self.name = FromValue::from_value(name, value)?,
            _ => return Err(TypeError::UnknownProperty(name.to_string())),
        }
        Ok(())
    }
}

fn customer_doc() -> &'static TypeDoc {
    &CUSTOMER
}

pub static ORDER: TypeDoc = TypeDoc::new("shop", "PurchaseOrder")
    .doc(
        "@property int $id @id @generated_value
         @property Customer $customer
         @property int $quantity @unsigned",
    )
    .uses(&[Use::Entity {
        alias: "Customer",
        doc: customer_doc,
    }]);

#[derive(Debug, Default, Clone, PartialEq)]
pub struct PurchaseOrder {
    pub id: Option<i64>,
    pub customer: Option<Ref<Customer>>,
    pub quantity: u32,
}

impl Entity for PurchaseOrder {
    fn type_doc() -> &'static TypeDoc {
        &ORDER
    }

    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(self.id.into()),
            "customer" => Some(self.customer.clone().into()),
            "quantity" => Some(self.quantity.into()),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<(), TypeError> {
        match name {
            "id" => self.id = FromValue::from_value(name, value)?,
            "customer" => self.customer = FromValue::from_value(name, value)?,
            "quantity" => self.quantity = FromValue::from_value(name, value)?,
            _ => return Err(TypeError::UnknownProperty(name.to_string())),
        }
        Ok(())
    }
}

// ============================================================================
// Ticket (inherits its identifier from a base type)
// ============================================================================

pub static RECORD: TypeDoc = TypeDoc::new("support", "Record").doc(
    "@property int $id @id @generated_value
     @property string $title @length(20)",
);

fn record_doc() -> &'static TypeDoc {
    &RECORD
}

pub static TICKET: TypeDoc = TypeDoc::new("support", "Ticket")
    .doc(
        "@property string $title Longer titles for tickets @length(200)
         @property string $status @required",
    )
    .extends(record_doc);

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Ticket {
    pub id: Option<i64>,
    pub title: String,
    pub status: String,
}

impl Ticket {
    pub fn new(title: &str, status: &str) -> Self {
        Self {
            id: None,
            title: title.to_string(),
            status: status.to_string(),
        }
    }
}

impl Entity for Ticket {
    fn type_doc() -> &'static TypeDoc {
        &TICKET
    }

    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(self.id.into()),
            "title" => Some(self.title.clone().into()),
            "status" => Some(self.status.clone().into()),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<(), TypeError> {
        match name {
            "id" => self.id = FromValue::from_value(name, value)?,
            "title" => self.title = FromValue::from_value(name, value)?,
            "status" => self.status = FromValue::from_value(name, value)?,
            _ => return Err(TypeError::UnknownProperty(name.to_string())),
        }
        Ok(())
    }
}

// ============================================================================
// Note (plain integer identifier, binary payload)
// ============================================================================

pub static NOTE: TypeDoc = TypeDoc::new("desk", "Note").doc(
    "@property int $id @id @generated_value
     @property string $body
     @property bytes $digest @nullable",
);

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Note {
    pub id: i64,
    pub body: String,
    pub digest: Vec<u8>,
}

impl Entity for Note {
    fn type_doc() -> &'static TypeDoc {
        &NOTE
    }

    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(self.id.into()),
            "body" => Some(self.body.clone().into()),
            "digest" => Some(self.digest.clone().into()),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<(), TypeError> {
        match name {
            "id" => self.id = FromValue::from_value(name, value)?,
            "body" => self.body = FromValue::from_value(name, value)?,
            "digest" => {
                self.digest = Option::<Vec<u8>>::from_value(name, value)?.unwrap_or_default()
            }
            _ => return Err(TypeError::UnknownProperty(name.to_string())),
        }
        Ok(())
    }
}

// ============================================================================
// Country (natural text key)
// ============================================================================

pub static COUNTRY: TypeDoc = TypeDoc::new("geo", "Country").doc(
    "@property string $code @id @length(2)
     @property string $name @required",
);

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Country {
    pub code: String,
    pub name: String,
}

impl Entity for Country {
    fn type_doc() -> &'static TypeDoc {
        &COUNTRY
    }

    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "code" => Some(self.code.clone().into()),
            "name" => Some(self.name.clone().into()),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<(), TypeError> {
        match name {
            "code" => self.code = FromValue::from_value(name, value)?,
            "name" => self.name = FromValue::from_value(name, value)?,
            _ => return Err(TypeError::UnknownProperty(name.to_string())),
        }
        Ok(())
    }
}
