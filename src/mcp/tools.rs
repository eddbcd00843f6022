//! MCP Tool definitions and handlers
//!
//! Defines all available tools and their implementations.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::config::Config;
use crate::doctoc::client::DoctocClient;
use crate::doctoc::payloads::{
    appointment_types_body, endpoints, AppointmentById, BusySlots, CancelAppointment,
    CreateAppointment, CreatePatient, CreatePayment, DayAppointments, DayPayments, DeletePatient,
    ListPatients, OrgSection, PatientLookup, PriceFilter, SearchPatients, UpdateAppointment,
    UpdatePatient, UpdateUserCalendar, UserDayAppointments, UserLookup,
};
use crate::doctoc::pricing::PriceCatalog;
use crate::error::{ApiResult, McpError, Result};
use crate::mcp::types::{CallToolResult, Tool};
use crate::unipile::client::UnipileClient;

/// Tool handler
pub struct ToolHandler {
    doctoc: Arc<DoctocClient>,
    unipile: Arc<UnipileClient>,
}

impl ToolHandler {
    /// Create a new tool handler
    pub fn new(doctoc: Arc<DoctocClient>, unipile: Arc<UnipileClient>) -> Self {
        Self { doctoc, unipile }
    }

    /// Build both clients from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let doctoc = DoctocClient::new(config.doctoc.clone(), config.request_timeout)?;
        let unipile = UnipileClient::new(config.unipile.clone(), config.request_timeout)?;
        Ok(Self::new(Arc::new(doctoc), Arc::new(unipile)))
    }

    /// List all available tools
    pub fn list_tools(&self) -> Vec<Tool> {
        tool_definitions()
    }

    /// Call a tool by name
    pub async fn call_tool(&self, name: &str, args: Value) -> CallToolResult {
        use endpoints::*;

        match name {
            // Telegram
            "list-telegram-chats" => self.handle_list_chats(args).await,
            "read-telegram-messages" => self.handle_read_messages(args).await,
            "send-telegram-message" => self.handle_send_message(args).await,

            // Appointments
            "create-appointment" => self.send_with(name, args, MANAGE_QUOTES, CreateAppointment::body).await,
            "update-appointment" => self.send_with(name, args, MANAGE_QUOTES, UpdateAppointment::body).await,
            "cancel-appointment" => self.send_with(name, args, MANAGE_QUOTES, CancelAppointment::body).await,
            "get-patient-appointments" => self.send_with(name, args, PATIENT_QUOTES, PatientLookup::body).await,
            "get-day-appointments" => self.send_with(name, args, DAY_QUOTES, DayAppointments::body).await,
            "get-appointment-by-id" => self.send_with(name, args, DAY_QUOTES, AppointmentById::body).await,
            "get-user-day-appointments" => self.send_with(name, args, DAY_QUOTES, UserDayAppointments::body).await,
            "get-busy-slots" => self.send_with(name, args, DAY_QUOTES, BusySlots::body).await,

            // Patients
            "get-all-patients" => self.send_with(name, args, MANAGE_PATIENTS, ListPatients::body).await,
            "search-patients" => self.send_with(name, args, MANAGE_PATIENTS, SearchPatients::body).await,
            "create-patient" => self.send_with(name, args, MANAGE_PATIENTS, CreatePatient::body).await,
            "update-patient" => self.send_with(name, args, MANAGE_PATIENTS, UpdatePatient::body).await,
            "delete-patient" => self.send_with(name, args, MANAGE_PATIENTS, DeletePatient::body).await,

            // Users
            "get-user-info" => self.send_with(name, args, MANAGE_USER_INFO, UserLookup::info_body).await,
            "get-user-calendar" => self.send_with(name, args, MANAGE_USER_INFO, UserLookup::calendar_body).await,
            "get-appointment-types" => self.send(name, MANAGE_USER_INFO, appointment_types_body()).await,
            "update-user-calendar" => self.send_with(name, args, MANAGE_USER_INFO, UpdateUserCalendar::body).await,

            // Organization
            "get-org-basic-info" => self.send(name, ORG_INFO, OrgSection::Basic.body()).await,
            "get-org-locations" => self.send(name, ORG_INFO, OrgSection::Locations.body()).await,
            "get-org-specialties" => self.send(name, ORG_INFO, OrgSection::Specialties.body()).await,
            "get-org-users" => self.send(name, ORG_INFO, OrgSection::Users.body()).await,

            // Prices
            "get-prices" => self.handle_get_prices(args).await,
            "get-price-categories" => render(name, PriceCatalog::new(&self.doctoc).categories().await),
            "get-prices-and-categories" => render(name, PriceCatalog::new(&self.doctoc).both().await),

            // Payments
            "create-payment" => self.send_with(name, args, MANAGE_PAYMENT, CreatePayment::body).await,
            "get-patient-payments" => self.send_with(name, args, PATIENT_PAYMENTS, PatientLookup::body).await,
            "get-day-payments" => self.send_with(name, args, DAY_PAYMENTS, DayPayments::body).await,

            _ => CallToolResult::error(
                McpError::UnknownTool {
                    name: name.to_string(),
                }
                .to_string(),
            ),
        }
    }

    // ==================== Doctoc Handlers ====================

    async fn send(&self, tool: &str, endpoint: &str, body: Map<String, Value>) -> CallToolResult {
        render(tool, self.doctoc.send(endpoint, body).await)
    }

    /// Parse `args` as `T` and send the body it maps to
    async fn send_with<T, F>(&self, tool: &str, args: Value, endpoint: &str, build: F) -> CallToolResult
    where
        T: DeserializeOwned,
        F: FnOnce(&T) -> Map<String, Value>,
    {
        let params: T = match parse_args(args) {
            Ok(p) => p,
            Err(result) => return result,
        };

        self.send(tool, endpoint, build(&params)).await
    }

    async fn handle_get_prices(&self, args: Value) -> CallToolResult {
        let filter: PriceFilter = match parse_args(args) {
            Ok(f) => f,
            Err(result) => return result,
        };

        let result = PriceCatalog::new(&self.doctoc)
            .prices(filter.categoria_id.as_deref())
            .await;
        render("get-prices", result)
    }

    // ==================== Telegram Handlers ====================

    async fn handle_list_chats(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        struct Args {
            limit: Option<u32>,
            cursor: Option<String>,
        }

        let args: Args = match parse_args(args) {
            Ok(a) => a,
            Err(result) => return result,
        };

        let mut query = vec![
            ("account_type", "TELEGRAM".to_string()),
            ("limit", args.limit.unwrap_or(10).to_string()),
        ];
        if let Some(cursor) = args.cursor.filter(|c| !c.is_empty()) {
            query.push(("cursor", cursor));
        }

        render("list-telegram-chats", self.unipile.fetch("/chats", &query).await)
    }

    async fn handle_read_messages(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        struct Args {
            chat_id: String,
            limit: Option<u32>,
        }

        let args: Args = match parse_args(args) {
            Ok(a) => a,
            Err(result) => return result,
        };

        let path = format!("/chats/{}/messages", urlencoding::encode(&args.chat_id));
        let query = [("limit", args.limit.unwrap_or(20).to_string())];

        render("read-telegram-messages", self.unipile.fetch(&path, &query).await)
    }

    async fn handle_send_message(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        struct Args {
            chat_id: String,
            text: String,
        }

        let args: Args = match parse_args(args) {
            Ok(a) => a,
            Err(result) => return result,
        };

        let chat_id = urlencoding::encode(&args.chat_id);
        render(
            "send-telegram-message",
            self.unipile.send_message(&chat_id, &args.text).await,
        )
    }
}

/// Deserialize tool arguments; a missing arguments object counts as empty
fn parse_args<T: DeserializeOwned>(args: Value) -> std::result::Result<T, CallToolResult> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args)
        .map_err(|e| {
            CallToolResult::error(
                McpError::InvalidArguments {
                    message: e.to_string(),
                }
                .to_string(),
            )
        })
}

/// Render a backend result as pretty JSON text, or as an error result
fn render(tool: &str, result: ApiResult<Value>) -> CallToolResult {
    match result {
        Ok(value) => CallToolResult::text(
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()),
        ),
        Err(e) => {
            tracing::error!("[{}] Error: {}", tool, e);
            CallToolResult::error(e.to_string())
        }
    }
}

// ==================== Tool Definitions ====================

fn tool_def(name: &str, description: &str, schema: Value) -> Tool {
    Tool {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema: schema,
    }
}

fn no_params() -> Value {
    json!({"type": "object", "properties": {}})
}

/// Every tool the server exposes
pub fn tool_definitions() -> Vec<Tool> {
    vec![
        tool_def("list-telegram-chats", "Lists available Telegram chats. Use it to find the chat_id needed to read or send messages", list_chats_schema()),
        tool_def("read-telegram-messages", "Reads the most recent messages of a Telegram chat. If you just sent a message and expect a reply, wait a few seconds before reading", read_messages_schema()),
        tool_def("send-telegram-message", "Sends a text message to a Telegram chat", send_message_schema()),
        tool_def("create-appointment", "Creates a new medical appointment. Requires dayKey as DD-MM-YYYY, ISO 8601 times, and the patient and doctor IDs", appointment_schema(false)),
        tool_def("update-appointment", "Updates an existing appointment. If it moves to another day, include oldDayKey with the original day", appointment_schema(true)),
        tool_def("cancel-appointment", "Cancels an existing appointment and records the cancellation in its history", cancel_appointment_schema()),
        tool_def("get-patient-appointments", "Gets all appointments of a specific patient", patient_id_schema()),
        tool_def("get-day-appointments", "Gets all appointments scheduled for a specific day", day_key_schema(&[], &[])),
        tool_def("get-appointment-by-id", "Gets a specific appointment by its ID and day", day_key_schema(&[("citaID", "Appointment ID")], &["citaID"])),
        tool_def("get-user-day-appointments", "Gets the appointments of a doctor/user on a specific day", day_key_schema(&[("userId", "Doctor/user UID")], &["userId"])),
        tool_def("get-busy-slots", "Gets the busy time ranges of a doctor on a day as [{ start, end }]. Useful to find available times", day_key_schema(&[("userId", "Doctor UID (optional, all doctors when omitted)")], &[])),
        tool_def("get-all-patients", "Lists the organization's patients with pagination. To find a specific patient use search-patients instead", list_patients_schema()),
        tool_def("search-patients", "Searches patients by name, DNI, phone, ID or other document. Returns partial matches", search_patients_schema()),
        tool_def("create-patient", "Creates a new patient in the organization", create_patient_schema()),
        tool_def("update-patient", "Updates an existing patient. Only send the fields to change", update_patient_schema()),
        tool_def("delete-patient", "Marks a patient as disabled (soft delete). Data is not removed permanently", patient_ref_schema()),
        tool_def("get-user-info", "Gets the basic and professional information of a doctor or system user", uid_schema()),
        tool_def("get-user-calendar", "Gets a doctor's calendar: fixed and dynamic schedules, associated appointment types and overbooking settings", uid_schema()),
        tool_def("get-appointment-types", "Gets the appointment types available in the organization (Consulta, Procedimiento, Teleconsulta, etc.)", no_params()),
        tool_def("update-user-calendar", "Updates a doctor's calendar settings: fixed and dynamic schedules, associated types and overbooking", update_calendar_schema()),
        tool_def("get-org-basic-info", "Gets the organization's basic information: name, legal name, RUC, description, website, image and social networks", no_params()),
        tool_def("get-org-locations", "Gets the organization's locations with name, address, coordinates, phone and email", no_params()),
        tool_def("get-org-specialties", "Gets the medical specialties offered by the organization", no_params()),
        tool_def("get-org-users", "Gets all users (doctors, staff) of the organization with uid, name, role, specialty and photo", no_params()),
        tool_def("get-prices", "Gets the prices of medical services, optionally filtered by category", get_prices_schema()),
        tool_def("get-price-categories", "Gets the price categories (e.g. Consultas, Procedimientos, Laboratorio)", no_params()),
        tool_def("get-prices-and-categories", "Gets prices and categories in a single call", no_params()),
        tool_def("create-payment", "Creates a new payment or receipt with the billed items (campos) and the payment methods used (pagos)", create_payment_schema()),
        tool_def("get-patient-payments", "Gets all payments of a patient with total, pending amount and detail", patient_id_schema()),
        tool_def("get-day-payments", "Gets all payments registered on a specific day", day_payments_schema()),
    ]
}

fn list_chats_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "limit": {
                "type": "number",
                "description": "Maximum number of chats to return (default 10)"
            },
            "cursor": {
                "type": "string",
                "description": "Pagination cursor for the next page of chats"
            }
        }
    })
}

fn read_messages_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "chat_id": {
                "type": "string",
                "description": "Telegram chat ID (from list-telegram-chats)"
            },
            "limit": {
                "type": "number",
                "description": "Number of messages to read (default 20)"
            }
        },
        "required": ["chat_id"]
    })
}

fn send_message_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "chat_id": {"type": "string", "description": "Telegram chat ID"},
            "text": {"type": "string", "description": "Message text"}
        },
        "required": ["chat_id", "text"]
    })
}

fn appointment_schema(update: bool) -> Value {
    let mut schema = json!({
        "type": "object",
        "properties": {
            "dayKey": {"type": "string", "description": "Appointment day as DD-MM-YYYY"},
            "scheduledStart": {"type": "string", "description": "Start time in ISO 8601 (e.g. 2026-02-07T10:00:00.000Z)"},
            "scheduledEnd": {"type": "string", "description": "End time in ISO 8601"},
            "patient": {"type": "string", "description": "Patient ID"},
            "userId": {"type": "string", "description": "UID of the attending doctor/user"},
            "type": {"type": "string", "description": "Appointment type: Consulta, Teleconsulta, Procedimiento, etc."},
            "typeId": {"type": "string", "description": "Appointment type ID"},
            "motive": {"type": "string", "description": "Reason for the appointment"},
            "status": {"type": "string", "description": "Status: pending, confirmada, etc. (default pending)"},
            "locationId": {"type": "string", "description": "Location ID"},
            "category": {"type": "string", "description": "Category (default cita)"},
            "personaEjecutante": {"type": "string", "description": "Person registering the change (default Administrador)"}
        },
        "required": ["dayKey", "scheduledStart", "scheduledEnd", "patient", "userId", "type", "motive"]
    });

    if update {
        schema["properties"]["quoteID"] = json!({"type": "string", "description": "ID of the appointment to update"});
        schema["properties"]["oldDayKey"] = json!({"type": "string", "description": "Original day if the appointment changes day (DD-MM-YYYY)"});
        if let Some(required) = schema["required"].as_array_mut() {
            required.insert(0, json!("quoteID"));
        }
    }

    schema
}

fn cancel_appointment_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "dayKey": {"type": "string", "description": "Appointment day as DD-MM-YYYY"},
            "quoteID": {"type": "string", "description": "ID of the appointment to cancel"},
            "userId": {"type": "string", "description": "UID of the associated doctor"},
            "cancelReason": {"type": "string", "description": "Cancellation reason"},
            "personaEjecutante": {"type": "string", "description": "Person cancelling (default Administrador)"}
        },
        "required": ["dayKey", "quoteID", "userId"]
    })
}

fn patient_id_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "patientID": {"type": "string", "description": "Patient ID"}
        },
        "required": ["patientID"]
    })
}

fn day_key_schema(extra: &[(&str, &str)], extra_required: &[&str]) -> Value {
    let mut properties = Map::new();
    properties.insert(
        "dayKey".to_string(),
        json!({"type": "string", "description": "Day as DD-MM-YYYY"}),
    );
    for (name, description) in extra {
        properties.insert(
            name.to_string(),
            json!({"type": "string", "description": description}),
        );
    }

    let mut required = vec!["dayKey"];
    required.extend_from_slice(extra_required);

    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

fn list_patients_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "limit": {"type": "number", "description": "Maximum patients to return (default 50)"},
            "startAfter": {"type": "string", "description": "ID of the last patient of the previous page"}
        }
    })
}

fn search_patients_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "type": {
                "type": "string",
                "enum": ["nombre", "dni", "telefono", "id", "pasaporte", "cedula_identidad", "carnet_extranjeria"],
                "description": "Search field"
            },
            "text": {"type": "string", "description": "Text to search for"},
            "limit": {"type": "number", "description": "Maximum results (default 10)"}
        },
        "required": ["type", "text"]
    })
}

fn create_patient_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "names": {"type": "string", "description": "Given names"},
            "surnames": {"type": "string", "description": "Surnames"},
            "dni": {"type": "string", "description": "Identity document number"},
            "birth_date": {"type": "string", "description": "Birth date as YYYY-MM-DD"},
            "gender": {"type": "string", "description": "Gender: Masculino or Femenino"},
            "phone": {"type": "string", "description": "Phone with country code (e.g. +51999111222)"},
            "mail": {"type": "string", "description": "Email address"}
        },
        "required": ["names", "surnames", "dni", "birth_date", "gender"]
    })
}

fn update_patient_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "patient_id": {"type": "string", "description": "ID of the patient to update"},
            "names": {"type": "string"},
            "surnames": {"type": "string"},
            "phone": {"type": "string"},
            "mail": {"type": "string"},
            "birth_date": {"type": "string", "description": "YYYY-MM-DD"},
            "gender": {"type": "string"}
        },
        "required": ["patient_id"]
    })
}

fn patient_ref_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "patient_id": {"type": "string", "description": "ID of the patient to disable"}
        },
        "required": ["patient_id"]
    })
}

fn uid_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "uid": {"type": "string", "description": "Doctor/user UID"}
        },
        "required": ["uid"]
    })
}

fn update_calendar_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "uid": {"type": "string", "description": "Doctor/user UID"},
            "calendarData": {
                "type": "object",
                "description": "calendarInfo object with the new schedule configuration"
            }
        },
        "required": ["uid", "calendarData"]
    })
}

fn get_prices_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "categoriaID": {
                "type": "string",
                "description": "Category ID to filter prices (optional, all prices when omitted)"
            }
        }
    })
}

fn create_payment_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "patient": {"type": "string", "description": "Patient ID"},
            "medico": {"type": "string", "description": "ID of the doctor associated with the payment"},
            "motive": {"type": "string", "description": "Payment reason (e.g. Consulta general)"},
            "time": {"type": "string", "description": "Payment date as YYYY-MM-DD"},
            "descuento": {"type": "number", "description": "Discount percentage"},
            "igv": {"type": "number", "description": "IGV/tax percentage"},
            "moneda": {"type": "string", "description": "Currency: Soles or Dolares (default Soles)"},
            "campos": {
                "type": "array",
                "description": "Billed items",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "quantity": {"type": "number"},
                        "price": {"type": "number"},
                        "subTotal": {"type": "number"}
                    },
                    "required": ["name", "quantity", "price", "subTotal"]
                }
            },
            "pagos": {
                "type": "array",
                "description": "Payments made",
                "items": {
                    "type": "object",
                    "properties": {
                        "method": {"type": "string", "description": "Efectivo, Tarjeta, Transferencia"},
                        "amount": {"type": "string"},
                        "moneda": {"type": "string"}
                    },
                    "required": ["method", "amount", "moneda"]
                }
            },
            "person": {"type": "string", "description": "ID or name of the person registering the payment"},
            "sedeID": {"type": "string", "description": "Location ID"},
            "status": {"type": "string", "description": "completado or pendiente (default completado)"}
        },
        "required": ["patient", "motive", "time", "campos", "pagos", "person"]
    })
}

fn day_payments_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "date": {"type": "string", "description": "Date as YYYY-MM-DD"}
        },
        "required": ["date"]
    })
}
