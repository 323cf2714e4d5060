/*! Integration tests for Dossier.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - patch: diff, apply and validate, including property tests
 * - store: DocumentStore over each backend, retention and persistence
 * - coordinator: leases, conflicts and the end-to-end mutation scenario
 * - service: the HTTP binding exercised over a real socket
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("dossier=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod helpers;
mod service;
