use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::models::ParteDiario;
use crate::service::sync::format_amount;

const HEADER: [&str; 11] = [
    "fecha",
    "proyecto",
    "frente",
    "responsable",
    "partida",
    "descripcion",
    "unidad",
    "metrado",
    "personal",
    "horas_maquina",
    "observaciones",
];

/// One spreadsheet row per activity, header first
pub fn export_field_report_csv<W: Write>(report: &ParteDiario, out: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(HEADER)?;

    let fecha = report.fecha.format("%d/%m/%Y").to_string();
    let frente = report.frente.clone().unwrap_or_default();
    for act in &report.actividades {
        writer.write_record(&[
            fecha.clone(),
            report.proyecto.clone(),
            frente.clone(),
            report.responsable.clone(),
            act.partida.clone(),
            act.descripcion.clone(),
            act.unidad_de_medida.clone(),
            format_amount(act.metrado),
            act.personal.to_string(),
            format_amount(act.horas_maquina),
            act.observaciones.clone().unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn export_field_report_bytes(report: &ParteDiario) -> Result<Vec<u8>, csv::Error> {
    let mut buf = Vec::new();
    export_field_report_csv(report, &mut buf)?;
    Ok(buf)
}

pub fn export_field_report_to_path(report: &ParteDiario, path: &Path) -> Result<(), csv::Error> {
    let file = File::create(path)?;
    export_field_report_csv(report, file)?;
    tracing::info!(
        "Exported field report {} ({} activities) to {}",
        report.fecha,
        report.actividades.len(),
        path.display()
    );
    Ok(())
}

/// Suggested download name, e.g. `parte-diario-2024-03-15.csv`
pub fn export_file_name(report: &ParteDiario) -> String {
    format!("parte-diario-{}.csv", report.fecha.format("%Y-%m-%d"))
}
