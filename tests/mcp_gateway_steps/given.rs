//! Given steps for MCP gateway BDD scenarios.

use super::world::{GatewayWorld, build_request, endpoint_for, run_async, text_result};
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given(r#"a backend "{server}" offering tools "{tools}""#)]
fn a_backend_offering(
    world: &mut GatewayWorld,
    server: String,
    tools: String,
) -> Result<(), eyre::Report> {
    world.serve(&server, &tools)
}

#[given(r#"the backend "{server}" answers "{tool}" with a text result of "{text}""#)]
fn backend_answers(
    world: &mut GatewayWorld,
    server: String,
    tool: String,
    text: String,
) -> Result<(), eyre::Report> {
    let result = text_result(&text);
    world
        .backend
        .respond_with(&endpoint_for(&server)?, &tool, result.clone());
    world.scripted_result = Some(result);
    Ok(())
}

#[given(r#"the backend "{server}" is unreachable"#)]
fn backend_unreachable(world: &mut GatewayWorld, server: String) -> Result<(), eyre::Report> {
    world.backend.set_unreachable(&endpoint_for(&server)?);
    Ok(())
}

#[given(r#"a registered server "{server}" offering tools "{tools}""#)]
fn registered_server(
    world: &mut GatewayWorld,
    server: String,
    tools: String,
) -> Result<(), eyre::Report> {
    world.serve(&server, &tools)?;
    let request = build_request(&server)?;
    run_async(world.lifecycle.register(request))
        .wrap_err_with(|| format!("register '{server}' for scenario"))?;
    Ok(())
}
