use chrono::{DateTime, Local, NaiveDateTime};

pub const RUN_ID_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Second-resolution run id; two runs of one target within the same second collide.
pub fn new_run_id() -> String {
    run_id_at(Local::now())
}

pub fn run_id_at(when: DateTime<Local>) -> String {
    when.format(RUN_ID_FORMAT).to_string()
}

/// True when `id` is exactly what [`run_id_at`] produces, so it names a single
/// directory under the target dir and nothing else.
pub fn is_run_id(id: &str) -> bool {
    id.len() == 15
        && id.bytes().all(|b| b.is_ascii_digit() || b == b'_')
        && NaiveDateTime::parse_from_str(id, RUN_ID_FORMAT).is_ok()
}
