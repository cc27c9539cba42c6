//! Shared helpers for the scripted-driver integration tests.

use asupersync::{Cx, Outcome};
use fbsql::{ConnectOptions, Error, FirebirdClient, Row, Value};
use fbsql_sim::SimDriver;

pub fn unwrap_outcome<T>(outcome: Outcome<T, Error>) -> T {
    match outcome {
        Outcome::Ok(v) => v,
        Outcome::Err(e) => panic!("unexpected error: {e}"),
        Outcome::Cancelled(r) => panic!("cancelled: {r:?}"),
        Outcome::Panicked(p) => panic!("panicked: {p:?}"),
    }
}

pub fn options() -> ConnectOptions {
    ConnectOptions::new("localhost", "SYSDBA", "/data/test.fdb")
}

/// The bootstrap lookup row that marks the VARCHAR5000 domain as present.
pub fn domain_row() -> Row {
    Row::from_pairs(vec![("fname", Value::from("VARCHAR5000"))])
}

/// A catalog metadata row in the shape the column lookup selects.
pub fn metadata_row(length: i64, ftype: i64, fsource: &str, cname: &str) -> Row {
    Row::from_pairs(vec![
        ("flength", Value::Int(length)),
        ("ftype", Value::Int(ftype)),
        ("fsource", Value::from(fsource)),
        ("cname", Value::from(cname)),
    ])
}

/// Initialize a client against `sim` with the legacy domain already present,
/// so tests start from a clean statement log baseline of one lookup.
pub async fn client_with_domain(cx: &Cx, sim: &SimDriver) -> FirebirdClient<SimDriver> {
    sim.respond("rdb$field_name = 'VARCHAR5000'", vec![domain_row()]);
    unwrap_outcome(FirebirdClient::initialize(cx, sim.clone(), options()).await)
}
