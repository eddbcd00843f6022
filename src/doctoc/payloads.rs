//! Tool parameters and the Doctoc request bodies built from them.
//!
//! Shared endpoints (`manageQuotesAPI`, `managePatientsAPI`, ...) select
//! server-side behavior through an `action` field, which every builder for
//! such an endpoint sets. Absent optional fields are either omitted or
//! replaced with the documented default. Update builders are sparse: only
//! fields the caller supplied are sent.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Doctoc endpoint names
pub mod endpoints {
    pub const MANAGE_QUOTES: &str = "manageQuotesAPI";
    pub const PATIENT_QUOTES: &str = "getPatientQuoteAPI";
    pub const DAY_QUOTES: &str = "getDayQuotesAPI";
    pub const MANAGE_PATIENTS: &str = "managePatientsAPI";
    pub const MANAGE_USER_INFO: &str = "manageUserInfoAPI";
    pub const ORG_INFO: &str = "getOrgInfoAPI";
    pub const PRICES: &str = "getPricesAPI";
    pub const MANAGE_PAYMENT: &str = "managePaymentAPI";
    pub const PATIENT_PAYMENTS: &str = "getPatientPaymentsAPI";
    pub const DAY_PAYMENTS: &str = "getDayPaymentsAPI";
}

pub const DEFAULT_APPOINTMENT_STATUS: &str = "pending";
pub const DEFAULT_CATEGORY: &str = "cita";
pub const DEFAULT_EXECUTOR: &str = "Administrador";
pub const DEFAULT_CURRENCY: &str = "Soles";
pub const DEFAULT_PAYMENT_STATUS: &str = "completado";

/// Build a body map from `key => value` pairs
macro_rules! body {
    ($($key:expr => $value:expr),* $(,)?) => {{
        let mut map = Map::new();
        $(map.insert($key.to_string(), json!($value));)*
        map
    }};
}

/// Insert `value` under `key` only when the caller supplied it
fn insert_opt<T: Serialize>(map: &mut Map<String, Value>, key: &str, value: &Option<T>) {
    if let Some(v) = value {
        map.insert(key.to_string(), json!(v));
    }
}

/// Like `insert_opt`, but an empty string counts as absent
fn insert_non_empty(map: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
        map.insert(key.to_string(), json!(v));
    }
}

// ==================== Appointments ====================

/// Fields shared by appointment creation and update
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentFields {
    pub day_key: String,
    pub scheduled_start: String,
    pub scheduled_end: String,
    pub patient: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub appointment_type: String,
    pub type_id: Option<String>,
    pub motive: String,
    pub status: Option<String>,
    pub location_id: Option<String>,
    pub category: Option<String>,
    pub persona_ejecutante: Option<String>,
}

impl AppointmentFields {
    fn body(&self, action: &str) -> Map<String, Value> {
        body! {
            "action" => action,
            "dayKey" => self.day_key,
            "scheduledStart" => self.scheduled_start,
            "scheduledEnd" => self.scheduled_end,
            "patient" => self.patient,
            "userId" => self.user_id,
            "type" => self.appointment_type,
            "typeId" => self.type_id.as_deref().unwrap_or_default(),
            "motive" => self.motive,
            "status" => self.status.as_deref().unwrap_or(DEFAULT_APPOINTMENT_STATUS),
            "locationId" => self.location_id.as_deref().unwrap_or_default(),
            "recipeID" => "",
            "category" => self.category.as_deref().unwrap_or(DEFAULT_CATEGORY),
            "personaEjecutante" => self.persona_ejecutante.as_deref().unwrap_or(DEFAULT_EXECUTOR),
        }
    }
}

/// `create-appointment`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAppointment {
    #[serde(flatten)]
    pub fields: AppointmentFields,
}

impl CreateAppointment {
    pub fn body(&self) -> Map<String, Value> {
        self.fields.body("create")
    }
}

/// `update-appointment`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointment {
    #[serde(rename = "quoteID")]
    pub quote_id: String,
    /// Original day when the appointment moves to another day
    pub old_day_key: Option<String>,
    #[serde(flatten)]
    pub fields: AppointmentFields,
}

impl UpdateAppointment {
    pub fn body(&self) -> Map<String, Value> {
        let mut map = self.fields.body("update");
        map.insert("quoteID".to_string(), json!(self.quote_id));
        insert_non_empty(&mut map, "oldDayKey", &self.old_day_key);
        map
    }
}

/// `cancel-appointment`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelAppointment {
    pub day_key: String,
    #[serde(rename = "quoteID")]
    pub quote_id: String,
    pub user_id: String,
    pub cancel_reason: Option<String>,
    pub persona_ejecutante: Option<String>,
}

impl CancelAppointment {
    pub fn body(&self) -> Map<String, Value> {
        body! {
            "action" => "cancel",
            "dayKey" => self.day_key,
            "quoteID" => self.quote_id,
            "userId" => self.user_id,
            "cancelReason" => self.cancel_reason.as_deref().unwrap_or_default(),
            "personaEjecutante" => self.persona_ejecutante.as_deref().unwrap_or(DEFAULT_EXECUTOR),
        }
    }
}

/// `get-patient-appointments` and `get-patient-payments`
#[derive(Debug, Clone, Deserialize)]
pub struct PatientLookup {
    #[serde(rename = "patientID")]
    pub patient_id: String,
}

impl PatientLookup {
    pub fn body(&self) -> Map<String, Value> {
        body! { "patientID" => self.patient_id }
    }
}

/// `get-day-appointments`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAppointments {
    pub day_key: String,
}

impl DayAppointments {
    pub fn body(&self) -> Map<String, Value> {
        body! { "dayKey" => self.day_key }
    }
}

/// `get-appointment-by-id`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentById {
    pub day_key: String,
    #[serde(rename = "citaID")]
    pub cita_id: String,
}

impl AppointmentById {
    pub fn body(&self) -> Map<String, Value> {
        body! {
            "dayKey" => self.day_key,
            "citaID" => self.cita_id,
        }
    }
}

/// `get-user-day-appointments`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDayAppointments {
    pub day_key: String,
    pub user_id: String,
}

impl UserDayAppointments {
    pub fn body(&self) -> Map<String, Value> {
        body! {
            "dayKey" => self.day_key,
            "userId" => self.user_id,
        }
    }
}

/// `get-busy-slots`: busy ranges (`[{start, end}]`) instead of full appointments
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusySlots {
    pub day_key: String,
    /// All doctors when absent
    pub user_id: Option<String>,
}

impl BusySlots {
    pub fn body(&self) -> Map<String, Value> {
        let mut map = body! {
            "dayKey" => self.day_key,
            "format" => "busy_ranges",
        };
        insert_non_empty(&mut map, "userId", &self.user_id);
        map
    }
}

// ==================== Patients ====================

/// `get-all-patients`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPatients {
    pub limit: Option<u32>,
    /// Id of the last patient of the previous page
    pub start_after: Option<String>,
}

impl ListPatients {
    pub fn body(&self) -> Map<String, Value> {
        let mut map = body! {
            "action" => "getAll",
            "limit" => self.limit.unwrap_or(50),
        };
        insert_non_empty(&mut map, "startFrom", &self.start_after);
        map
    }
}

/// Patient search criteria
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientSearchType {
    Nombre,
    Dni,
    Telefono,
    Id,
    Pasaporte,
    CedulaIdentidad,
    CarnetExtranjeria,
}

/// `search-patients`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPatients {
    #[serde(rename = "type")]
    pub search_type: PatientSearchType,
    pub text: String,
    pub limit: Option<u32>,
}

impl SearchPatients {
    pub fn body(&self) -> Map<String, Value> {
        body! {
            "action" => "search",
            "type" => self.search_type,
            "text" => self.text,
            "limit" => self.limit.unwrap_or(10),
        }
    }
}

/// `create-patient`
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePatient {
    pub names: String,
    pub surnames: String,
    pub dni: String,
    pub birth_date: String,
    pub gender: String,
    pub phone: Option<String>,
    pub mail: Option<String>,
}

impl CreatePatient {
    pub fn body(&self) -> Map<String, Value> {
        let mut map = body! {
            "action" => "create",
            "names" => self.names,
            "surnames" => self.surnames,
            "dni" => self.dni,
            "birth_date" => self.birth_date,
            "gender" => self.gender,
        };
        insert_opt(&mut map, "phone", &self.phone);
        insert_opt(&mut map, "mail", &self.mail);
        map
    }
}

/// `update-patient`
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePatient {
    pub patient_id: String,
    pub names: Option<String>,
    pub surnames: Option<String>,
    pub phone: Option<String>,
    pub mail: Option<String>,
    pub birth_date: Option<String>,
    pub gender: Option<String>,
}

impl UpdatePatient {
    pub fn body(&self) -> Map<String, Value> {
        let mut map = body! {
            "action" => "update",
            "patient_id" => self.patient_id,
        };
        insert_opt(&mut map, "names", &self.names);
        insert_opt(&mut map, "surnames", &self.surnames);
        insert_opt(&mut map, "phone", &self.phone);
        insert_opt(&mut map, "mail", &self.mail);
        insert_opt(&mut map, "birth_date", &self.birth_date);
        insert_opt(&mut map, "gender", &self.gender);
        map
    }
}

/// `delete-patient` (soft delete)
#[derive(Debug, Clone, Deserialize)]
pub struct DeletePatient {
    pub patient_id: String,
}

impl DeletePatient {
    pub fn body(&self) -> Map<String, Value> {
        body! {
            "action" => "delete",
            "patient_id" => self.patient_id,
        }
    }
}

// ==================== Users ====================

/// `get-user-info` and `get-user-calendar`
#[derive(Debug, Clone, Deserialize)]
pub struct UserLookup {
    pub uid: String,
}

impl UserLookup {
    pub fn info_body(&self) -> Map<String, Value> {
        self.sections_body(&["basic", "professional"])
    }

    pub fn calendar_body(&self) -> Map<String, Value> {
        self.sections_body(&["calendarInfo"])
    }

    fn sections_body(&self, sections: &[&str]) -> Map<String, Value> {
        body! {
            "action" => "get",
            "uid" => self.uid,
            "type" => "user",
            "sections" => sections,
        }
    }
}

/// Organization-wide appointment types
pub fn appointment_types_body() -> Map<String, Value> {
    body! {
        "action" => "get",
        "sections" => ["tipos"],
    }
}

/// `update-user-calendar`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserCalendar {
    pub uid: String,
    pub calendar_data: Map<String, Value>,
}

impl UpdateUserCalendar {
    pub fn body(&self) -> Map<String, Value> {
        body! {
            "action" => "update",
            "uid" => self.uid,
            "type" => "user",
            "data" => json!({ "calendarInfo": self.calendar_data }),
        }
    }
}

// ==================== Organization ====================

/// Sections of `getOrgInfoAPI`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrgSection {
    Basic,
    Locations,
    Specialties,
    Users,
}

impl OrgSection {
    fn as_str(self) -> &'static str {
        match self {
            OrgSection::Basic => "basic",
            OrgSection::Locations => "sedes",
            OrgSection::Specialties => "specialties",
            OrgSection::Users => "users",
        }
    }

    pub fn body(self) -> Map<String, Value> {
        body! { "sections" => [self.as_str()] }
    }
}

// ==================== Prices ====================

/// `get-prices`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceFilter {
    #[serde(rename = "categoriaID")]
    pub categoria_id: Option<String>,
}

/// Body for one `getPricesAPI` action (`prices`, `categories`, `both`)
pub fn prices_body(action: &str, categoria_id: Option<&str>) -> Map<String, Value> {
    let mut map = body! { "action" => action };
    if let Some(id) = categoria_id.filter(|id| !id.is_empty()) {
        map.insert("categoriaID".to_string(), json!(id));
    }
    map
}

// ==================== Payments ====================

/// A billed line item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentItem {
    pub name: String,
    pub quantity: f64,
    pub price: f64,
    pub sub_total: f64,
}

/// A payment method entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub method: String,
    pub amount: String,
    pub moneda: String,
}

/// `create-payment`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePayment {
    pub patient: String,
    pub medico: Option<String>,
    pub motive: String,
    pub time: String,
    pub descuento: Option<f64>,
    pub igv: Option<f64>,
    pub moneda: Option<String>,
    pub campos: Vec<PaymentItem>,
    pub pagos: Vec<PaymentMethod>,
    pub person: String,
    #[serde(rename = "sedeID")]
    pub sede_id: Option<String>,
    pub status: Option<String>,
}

impl CreatePayment {
    pub fn body(&self) -> Map<String, Value> {
        body! {
            "action" => "create",
            "paymentData" => json!({
                "patient": self.patient,
                "medico": self.medico.as_deref().unwrap_or_default(),
                "motive": self.motive,
                "time": self.time,
                "descuento": self.descuento.unwrap_or(0.0),
                "igv": self.igv.unwrap_or(0.0),
                "moneda": self.moneda.as_deref().unwrap_or(DEFAULT_CURRENCY),
                "campos": self.campos,
                "pagos": self.pagos,
                "person": self.person,
                "sedeID": self.sede_id.as_deref().unwrap_or_default(),
                "status": self.status.as_deref().unwrap_or(DEFAULT_PAYMENT_STATUS),
            }),
        }
    }
}

/// `get-day-payments`
#[derive(Debug, Clone, Deserialize)]
pub struct DayPayments {
    /// `YYYY-MM-DD`
    pub date: String,
}

impl DayPayments {
    pub fn body(&self) -> Map<String, Value> {
        body! { "date" => self.date }
    }
}
