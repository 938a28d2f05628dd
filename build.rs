// Build script that generates Rust code from the published parameter table.
// Build scripts are not consensus-critical, so we allow expect() and panic().
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
//
// Consumes `params/poseidon_bn254_t3.json` (circomlib Poseidon constants for
// t = 3) and generates:
// - `modulus_generated.rs` - field modulus constants
// - `params_generated.rs`  - widths, round counts, MDS matrix, round constants

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

const PARAMS_PATH: &str = "params/poseidon_bn254_t3.json";

#[derive(Debug, Deserialize)]
struct Metadata {
    version: String,
    field: FieldMetadata,
    poseidon: PoseidonMetadata,
}

#[derive(Debug, Deserialize)]
struct FieldMetadata {
    name: String,
    modulus: String,
    modulus_hex: String,
}

#[derive(Debug, Deserialize)]
struct PoseidonMetadata {
    width: usize,
    rate: usize,
    capacity: usize,
    full_rounds: usize,
    partial_rounds: usize,
    sbox_alpha: usize,
    mds_matrix: Vec<Vec<String>>,
    round_constants: Vec<Vec<String>>,
}

fn main() {
    println!("cargo:rerun-if-changed={}", PARAMS_PATH);
    println!("cargo:rerun-if-changed=build.rs");

    let content = fs::read_to_string(PARAMS_PATH)
        .unwrap_or_else(|e| panic!("cannot read {}: {}", PARAMS_PATH, e));
    let metadata: Metadata = serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("cannot parse {}: {}", PARAMS_PATH, e));

    if metadata.version != "1" {
        panic!(
            "unsupported parameter table version '{}', expected '1'",
            metadata.version
        );
    }
    validate_shape(&metadata.poseidon);

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set");
    let out_path = Path::new(&out_dir);

    generate_modulus_rs(out_path, &metadata.field);
    generate_params_rs(out_path, &metadata.poseidon);
}

/// A table with the wrong shape must never reach the compiler: the runtime
/// loader would reject it anyway, but only after the crate was shipped.
fn validate_shape(poseidon: &PoseidonMetadata) {
    let total = poseidon.full_rounds + poseidon.partial_rounds;
    assert_eq!(
        poseidon.rate + poseidon.capacity,
        poseidon.width,
        "rate + capacity must equal width"
    );
    assert_eq!(poseidon.full_rounds % 2, 0, "full rounds must be even");
    assert_eq!(
        poseidon.round_constants.len(),
        total,
        "expected one round-constant row per round"
    );
    for (round, row) in poseidon.round_constants.iter().enumerate() {
        assert_eq!(row.len(), poseidon.width, "round {} has wrong width", round);
    }
    assert_eq!(poseidon.mds_matrix.len(), poseidon.width, "MDS must be square");
    for row in &poseidon.mds_matrix {
        assert_eq!(row.len(), poseidon.width, "MDS must be square");
    }
    for value in poseidon
        .round_constants
        .iter()
        .chain(poseidon.mds_matrix.iter())
        .flatten()
    {
        assert!(
            value.len() == 64 && value.bytes().all(|b| b.is_ascii_hexdigit()),
            "constant '{}' is not 64 hex digits",
            value
        );
    }
}

fn generate_modulus_rs(out_path: &Path, field: &FieldMetadata) {
    let code = format!(
        r#"// Field modulus generated from {path}.
//
// DO NOT EDIT - This file is generated by build.rs

/// Name of the scalar field ({name}).
pub const FIELD_NAME: &str = "{name}";

/// Field modulus as decimal string.
pub const MODULUS_DECIMAL: &str = "{dec}";

/// Field modulus as 64-char big-endian hex.
pub const MODULUS_HEX: &str = "{hex}";
"#,
        path = PARAMS_PATH,
        name = field.name,
        dec = field.modulus,
        hex = field.modulus_hex
    );

    fs::write(out_path.join("modulus_generated.rs"), code)
        .expect("Failed to write modulus_generated.rs");
}

fn generate_params_rs(out_path: &Path, poseidon: &PoseidonMetadata) {
    let total_rounds = poseidon.full_rounds + poseidon.partial_rounds;
    let mut code = String::new();

    code.push_str(&format!(
        r#"// Poseidon parameters generated from {path}.
//
// DO NOT EDIT - This file is generated by build.rs

/// Poseidon state width of the embedded table (t = {width}).
pub const WIDTH: usize = {width};

/// Sponge rate of the embedded table (r = {rate}).
pub const RATE: usize = {rate};

/// Sponge capacity of the embedded table (c = {capacity}).
pub const CAPACITY: usize = {capacity};

/// Number of full rounds (RF = {full}).
pub const FULL_ROUNDS: usize = {full};

/// Number of partial rounds (RP = {partial}).
pub const PARTIAL_ROUNDS: usize = {partial};

/// Total rounds (RF + RP = {total}).
pub const TOTAL_ROUNDS: usize = {total};

/// S-box exponent (alpha = {alpha}).
pub const SBOX_ALPHA: usize = {alpha};

"#,
        path = PARAMS_PATH,
        width = poseidon.width,
        rate = poseidon.rate,
        capacity = poseidon.capacity,
        full = poseidon.full_rounds,
        partial = poseidon.partial_rounds,
        total = total_rounds,
        alpha = poseidon.sbox_alpha,
    ));

    code.push_str(&format!(
        "/// MDS matrix ({w}x{w}) as big-endian hex strings.\n",
        w = poseidon.width
    ));
    code.push_str(&format!(
        "pub const MDS_MATRIX: [[&str; {w}]; {w}] = [\n",
        w = poseidon.width
    ));
    for row in &poseidon.mds_matrix {
        code.push_str(&format!("    [{}],\n", quote_row(row)));
    }
    code.push_str("];\n\n");

    code.push_str(&format!(
        "/// Round constants ({} rounds x {} elements) as big-endian hex strings.\n",
        total_rounds, poseidon.width
    ));
    code.push_str(&format!(
        "pub const ROUND_CONSTANTS: [[&str; {}]; {}] = [\n",
        poseidon.width, total_rounds
    ));
    for (round, row) in poseidon.round_constants.iter().enumerate() {
        code.push_str(&format!("    // Round {}\n    [{}],\n", round, quote_row(row)));
    }
    code.push_str("];\n");

    fs::write(out_path.join("params_generated.rs"), code)
        .expect("Failed to write params_generated.rs");
}

fn quote_row(row: &[String]) -> String {
    row.iter()
        .map(|v| format!("\"{}\"", v))
        .collect::<Vec<_>>()
        .join(", ")
}
