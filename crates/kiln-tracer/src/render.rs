//! Text and JSON views of a trace

use std::collections::BTreeMap;
use std::fmt::Write;

use kiln_primitives::Word;
use serde_json::{json, Map, Value};

use crate::config::TracerConfig;
use crate::step::TraceStep;

fn opcode_label(step: &TraceStep, config: &TracerConfig) -> String {
    if config.opcode_as_hex {
        format!("0x{:02x}", step.opcode)
    } else {
        step.op_name()
    }
}

fn storage_value(value: &Word, config: &TracerConfig) -> String {
    if config.storage_value_as_hex {
        format!("{:#x}", value)
    } else {
        value.to_string()
    }
}

fn hex_words(words: &[Word]) -> String {
    let items: Vec<String> = words.iter().map(|w| format!("{:#x}", w)).collect();
    format!("[{}]", items.join(","))
}

fn storage_text(storage: &BTreeMap<Word, Word>, config: &TracerConfig) -> String {
    let items: Vec<String> = storage
        .iter()
        .map(|(k, v)| format!("{:#x}: {}", k, storage_value(v, config)))
        .collect();
    format!("{{{}}}", items.join(", "))
}

/// One line per step, sub-calls indented by two spaces per depth level
pub fn to_text(steps: &[TraceStep], config: &TracerConfig) -> String {
    let mut out = String::new();
    for step in steps {
        write_step(&mut out, step, config);
    }
    out
}

fn write_step(out: &mut String, step: &TraceStep, config: &TracerConfig) {
    let indent = "  ".repeat(step.depth);
    let mut line = format!(
        "{}{:>5} {:<8} gas={} cost={}",
        indent,
        step.pc,
        opcode_label(step, config),
        step.gas,
        step.gas_cost
    );

    if let Some(detail) = &step.gas_detail {
        let _ = write!(line, " (base={} dynamic={})", detail.base, detail.dynamic);
    }
    if let Some(io) = &step.stack_in_out {
        let _ = write!(line, " in={} out={}", hex_words(&io.inputs), hex_words(&io.outputs));
    }
    if let Some(stack) = &step.stack {
        let _ = write!(line, " stack={}", hex_words(stack));
    }
    if let Some(memory) = &step.memory {
        let _ = write!(line, " memory=0x{}", hex::encode(memory));
    }
    if let Some(storage) = &step.storage {
        let _ = write!(line, " storage={}", storage_text(storage, config));
    }
    if let Some(error) = &step.error {
        let _ = write!(line, " error=\"{}\"", error);
    }

    out.push_str(&line);
    out.push('\n');

    for call in &step.calls {
        write_step(out, call, config);
    }
}

/// JSON array of steps with opcode and storage formatting applied
pub fn to_json(steps: &[TraceStep], config: &TracerConfig) -> Value {
    Value::Array(steps.iter().map(|step| step_json(step, config)).collect())
}

fn step_json(step: &TraceStep, config: &TracerConfig) -> Value {
    let mut obj = json!({
        "pc": step.pc,
        "op": opcode_label(step, config),
        "depth": step.depth,
        "address": step.address.to_hex(),
        "gas": step.gas,
        "gasCost": step.gas_cost,
    });

    let Some(map) = obj.as_object_mut() else {
        return obj;
    };

    if let Some(detail) = &step.gas_detail {
        map.insert(
            "gasDetail".into(),
            json!({
                "base": detail.base,
                "dynamic": detail.dynamic,
                "remainingBefore": detail.remaining_before,
                "remainingAfter": detail.remaining_after,
                "spent": detail.spent,
                "refunded": detail.refunded,
            }),
        );
    }
    if let Some(io) = &step.stack_in_out {
        map.insert(
            "stackInOut".into(),
            json!({
                "in": words_json(&io.inputs),
                "out": words_json(&io.outputs),
            }),
        );
    }
    if let Some(stack) = &step.stack {
        map.insert("stack".into(), words_json(stack));
    }
    if let Some(memory) = &step.memory {
        map.insert("memory".into(), json!(format!("0x{}", hex::encode(memory))));
    }
    if let Some(storage) = &step.storage {
        let entries: Map<String, Value> = storage
            .iter()
            .map(|(k, v)| (format!("{:#x}", k), json!(storage_value(v, config))))
            .collect();
        map.insert("storage".into(), Value::Object(entries));
    }
    if let Some(error) = &step.error {
        map.insert("error".into(), json!(error));
    }
    if !step.calls.is_empty() {
        map.insert("calls".into(), to_json(&step.calls, config));
    }

    obj
}

fn words_json(words: &[Word]) -> Value {
    Value::Array(words.iter().map(|w| json!(format!("{:#x}", w))).collect())
}
