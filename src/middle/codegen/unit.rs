//! Translation unit assembly

use super::{c_declaration, CodeBuffer};
use crate::frontend::context::CompilationContext;
use crate::frontend::symbols::{mangle_symbol, Body, Candidate};
use std::collections::HashSet;
use tracing::{debug, warn};

const HEADER: &str = "\
#include <stdbool.h>
#include <stdint.h>
#include <stdlib.h>
#include <string.h>

typedef int8_t i8;
typedef uint8_t u8;
typedef int16_t i16;
typedef uint16_t u16;
typedef int32_t i32;
typedef uint32_t u32;
typedef int64_t i64;
typedef uint64_t u64;
typedef __int128 i128;
typedef unsigned __int128 u128;
typedef float f32;
typedef double f64;
typedef long double f128;
typedef const char *str;";

/// Function candidate selected for output
struct Emitted<'a> {
    mangled: String,
    candidate: &'a Candidate,
}

impl<'a> Emitted<'a> {
    fn declaration(&self) -> String {
        c_declaration(&self.candidate.ty, &self.mangled)
    }
}

/// Every function candidate worth emitting, one per mangled name
///
/// Builtins appear only when something references them.
fn functions(ctx: &CompilationContext) -> Vec<Emitted<'_>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for (name, candidates) in ctx.symbols.iter() {
        for candidate in candidates.iter().filter(|c| c.ty.is_function()) {
            let mangled = mangle_symbol(name, &candidate.ty);
            if matches!(candidate.body, Body::Builtin(_)) && !ctx.referenced.contains(&mangled) {
                continue;
            }
            if seen.insert(mangled.clone()) {
                out.push(Emitted { mangled, candidate });
            }
        }
    }
    out
}

/// Render the complete C translation unit
pub fn emit_unit(ctx: &CompilationContext) -> String {
    let mut buffer = CodeBuffer::new();
    buffer.raw(HEADER);
    buffer.blank();

    if !ctx.structs.is_empty() {
        for (name, _) in ctx.structs.iter() {
            buffer.line(&format!("typedef struct {} {};", name, name));
        }
        buffer.blank();
        for (name, data) in ctx.structs.iter() {
            buffer.line(&format!("struct {} {{", name));
            if data.members.is_empty() {
                buffer.line("    char unit;");
            }
            for (member, ty) in &data.members {
                buffer.line(&format!("    {};", c_declaration(ty, member)));
            }
            buffer.line("};");
        }
        buffer.blank();
    }

    let functions = functions(ctx);
    for function in &functions {
        if matches!(function.candidate.body, Body::Builtin(_)) {
            buffer.line(&format!("static inline {};", function.declaration()));
        } else {
            buffer.line(&format!("{};", function.declaration()));
        }
    }
    buffer.blank();

    let mut globals = HashSet::new();
    for (name, candidates) in ctx.symbols.iter() {
        for candidate in candidates.iter().filter(|c| !c.ty.is_function()) {
            if globals.insert(name.as_str()) {
                buffer.line(&format!("{};", c_declaration(&candidate.ty, name)));
            }
        }
    }
    if !globals.is_empty() {
        buffer.blank();
    }

    for function in &functions {
        match &function.candidate.body {
            Body::Builtin(text) => {
                buffer.raw(text);
                buffer.blank();
            }
            Body::Sequence(body) => {
                buffer.function(&function.declaration(), body);
                buffer.blank();
            }
            Body::None => {}
        }
    }

    if ctx.config.emit_main_warning && !ctx.symbols.contains("main") {
        warn!("translation unit has no 'main' function");
    }
    debug!(
        "emitted {} functions, {} structs, {} globals",
        functions.len(),
        ctx.structs.len(),
        globals.len()
    );
    buffer.finish()
}
