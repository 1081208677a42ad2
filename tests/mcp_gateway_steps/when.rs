//! When steps for MCP gateway BDD scenarios.

use super::world::{GatewayWorld, build_request, calculator_arguments, run_async};
use rstest_bdd_macros::when;

#[when(r#"the server "{server}" is registered"#)]
fn register_server(world: &mut GatewayWorld, server: String) -> Result<(), eyre::Report> {
    let request = build_request(&server)?;
    world.last_register_result = Some(run_async(world.lifecycle.register(request)));
    Ok(())
}

#[when(r#"the server "{server}" is deregistered"#)]
fn deregister_server(world: &mut GatewayWorld, server: String) -> Result<(), eyre::Report> {
    run_async(world.lifecycle.deregister(&server))
        .map_err(|err| eyre::eyre!("deregistration failed: {err}"))
}

#[when(r#""{public_name}" is invoked with a of {a:i64} and b of {b:i64}"#)]
fn invoke_tool(world: &mut GatewayWorld, public_name: String, a: i64, b: i64) {
    let arguments = calculator_arguments(a, b);
    world.last_invoke_result = Some(run_async(world.router.invoke(&public_name, arguments)));
}
