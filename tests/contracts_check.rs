mod common;

use common::TestEnv;
use jsonschema::JSONSchema;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

fn load_schema(name: &str) -> Value {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let raw = fs::read_to_string(root.join("docs/contracts").join(name)).unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn validate(schema_name: &str, data: &Value) {
    let schema = load_schema(schema_name);
    let validator = JSONSchema::compile(&schema).expect("compile schema");
    let msgs: Vec<String> = match validator.validate(data) {
        Ok(()) => return,
        Err(errors) => errors.map(|e| e.to_string()).collect(),
    };
    panic!("schema validation failed: {}", msgs.join(" | "));
}

#[test]
fn contracts_check() {
    let env = TestEnv::new();
    env.login_admin();
    let agent = env.add_agent("Ion");
    env.add_client("Acme", "Cluj");

    let gen = env.run_json(&["plan", "generate", "--from", "2025-10-01", "--to", "2025-10-31"]);
    assert_eq!(gen["ok"], true);
    validate("plan-generate.schema.json", &gen["data"]);

    let list = env.run_json(&["visit", "list"]);
    let first = list["data"][0]["id"].as_str().unwrap().to_string();
    env.run_json(&["visit", "update", &first, "--agent", &agent, "--activity", "comanda"]);
    let list = env.run_json(&["visit", "list"]);
    assert_eq!(list["ok"], true);
    validate("visit-list.schema.json", &list["data"]);

    let report = env.run_json(&["report"]);
    validate("report.schema.json", &report["data"]);

    let err = env.run_json_err(&["visit", "remove", "missing"]);
    assert_eq!(err["error"]["code"], "NOT_FOUND");
    validate("error.schema.json", &err);
}
