//! Query compiler
//!
//! Rewrites parsed queries into the canonical commands consumed by the
//! enforcement controller, and compiles default-policy configs into the
//! `user_policy` setup command sent during the handshake.
//!
//! | verb    | no filter      | with filter              |
//! |---------|----------------|--------------------------|
//! | put     | `put K V`      | `put K V -name value...` |
//! | get     | `get K`        | `get K -name value...`   |
//! | delete  | `delete K`     | `delete K -name value...`|
//! | putm    | `putm K`       | `putm K -name value...`  |
//! | getm    | `getm K`       | `getm K -name value...`  |
//! | deletem | `deletem K`    | `deletem K -name value...`|
//! | getlogs | `getLogs K`    | `getLogs K -name value...`|

mod policy;
mod rewriter;

pub use policy::{
    compile_setup, load_policy_config, missing_mandatory_keys, PolicyError, PolicyResult,
    DEFAULT_POLICY_KEY, MANDATORY_KEYS, SETUP_VERB,
};
pub use rewriter::{compile, compile_line, CompiledCommand};
