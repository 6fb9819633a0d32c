// End-to-end tests for the Talkback HTTP API
//
// Each test spawns the real router on an ephemeral port with in-memory
// storage and a scripted synthesis gateway, then drives it over HTTP.
//
// Architecture:
// - `helpers::spawn_app` wires store, gateway, orchestrator and router
// - `TestContext` is the default wiring, usable through test-context
// - Tests that need a tight quota, small capacity or a held-back gateway
//   call `spawn_app` with custom `AppSettings`

mod helpers;
mod test_health;
mod test_history;
