// Base model listing command

use agentdesk_core::known_models;
use anyhow::Result;
use serde::Serialize;

use crate::output::{print_table_header, print_table_row, OutputFormat};

#[derive(Debug, Serialize)]
struct ModelInfo {
    id: &'static str,
    name: &'static str,
}

pub fn run(output: OutputFormat) -> Result<()> {
    let models: Vec<ModelInfo> = known_models()
        .iter()
        .map(|(id, name)| ModelInfo { id, name })
        .collect();

    if output.is_text() {
        print_table_header(&[("ID", 16), ("NAME", 20)]);
        for model in &models {
            print_table_row(&[(model.id, 16), (model.name, 20)]);
        }
    } else {
        output.print_value(&models)?;
    }

    Ok(())
}
