/*!
 * confine - Run a script under a capability grant
 *
 * Usage: confine [--json] <grant> <script-file> [args...]
 *
 * <grant> is `all`, `none`, or a comma-separated permission list such as
 * `read_property,read_file`. Exit status is 0 on success, 2 when the script
 * was denied an operation, 1 for any other failure. With `--json` the result
 * is printed as JSON.
 */

use confine_engine::{
    init_tracing, CapabilitySet, ConfigError, ConfineError, EngineConfig, Sandbox, Value,
};
use std::process::ExitCode;
use tracing::info;

const USAGE: &str = "confine [--json] <grant> <script-file> [args...]";

const EXIT_DENIED: u8 = 2;
const EXIT_FAILURE: u8 = 1;

fn main() -> ExitCode {
    init_tracing();

    let mut argv: Vec<String> = std::env::args().skip(1).collect();
    let json = argv.first().is_some_and(|arg| arg == "--json");
    if json {
        argv.remove(0);
    }

    match run(argv).and_then(|value| render(&value, json)) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            let code = if err.is_access_denied() {
                EXIT_DENIED
            } else {
                EXIT_FAILURE
            };
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::from(code)
        }
    }
}

fn run(argv: Vec<String>) -> Result<Value, ConfineError> {
    let mut argv = argv.into_iter();
    let grant = argv
        .next()
        .ok_or_else(|| ConfineError::Usage(USAGE.to_string()))?;
    let path = argv
        .next()
        .ok_or_else(|| ConfineError::Usage(USAGE.to_string()))?;

    let grant: CapabilitySet = grant
        .parse()
        .map_err(|_| ConfigError::InvalidGrant(grant.clone()))?;
    let args: Vec<Value> = argv.map(|raw| parse_arg(&raw)).collect();

    let config = EngineConfig::from_env()?;
    let sandbox = Sandbox::with_config(config);

    let source = std::fs::read_to_string(&path)?;
    let unit = sandbox.compile(&path, &source)?;
    sandbox.confine(&unit, grant);
    info!(unit = %unit.id(), script = %path, grant = %grant, "running script");

    Ok(sandbox.invoke(&unit, &args)?)
}

fn render(value: &Value, json: bool) -> Result<String, ConfineError> {
    if !json {
        return Ok(value.to_string());
    }
    serde_json::to_string(value).map_err(|e| ConfineError::Io(e.into()))
}

/// Command-line arguments become ints or bools when they look like one
fn parse_arg(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        _ => raw
            .parse::<i64>()
            .map(Value::Int)
            .unwrap_or_else(|_| Value::str(raw)),
    }
}
