pub const APP_DIR: &str = "fieldplan";

pub const DEFAULT_MONTHLY_COUNT: u32 = 2;
pub const DEFAULT_MONTHLY_WEEKS: [u8; 2] = [1, 3];
pub const MAX_MONTHLY_COUNT: u32 = 50;
pub const MAX_WEEK_OF_MONTH: u8 = 5;

pub const DEFAULT_ACTIVITIES: [&str; 3] = ["comanda", "incasare", "comanda + incasare"];

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
pub const MIN_PASSWORD_LEN: usize = 4;

/// Indexed by `num_days_from_sunday`.
pub const DAY_NAMES: [&str; 7] = [
    "DUMINICA", "LUNI", "MARTI", "MIERCURI", "JOI", "VINERI", "SAMBATA",
];

pub const EXPORT_HEADER: [&str; 6] = ["Zi", "Data", "Client", "Activitate", "Detalii", "Observatii"];
pub const EXPORT_SHEET_NAME: &str = "Planificare";
pub const EXPORT_COLUMN_WIDTHS: [f64; 6] = [10.0, 12.0, 28.0, 28.0, 22.0, 22.0];

pub const NAME_COLUMNS: [&str; 6] = ["client", "nume", "nume client", "denumire", "customer", "name"];
pub const COUNTY_COLUMNS: [&str; 3] = ["judet", "județ", "county"];
pub const ADDRESS_COLUMNS: [&str; 5] = ["adresa", "adresă", "address", "locatie", "localizare"];
pub const PHONE_COLUMNS: [&str; 3] = ["telefon", "phone", "tel"];

pub const NO_ENTRY_LABEL: &str = "(fără)";
pub const REPORT_TOP_N: usize = 8;
