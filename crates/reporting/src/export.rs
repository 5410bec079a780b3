//! Report export: CSV, Excel-compatible TSV and branded HTML.

use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::str::FromStr;
use webpro_core::config::BrandingConfig;
use webpro_core::{PlatformData, WebProError, WebProResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Print-ready HTML document.
    Pdf,
    /// Tab-separated values.
    Excel,
    Csv,
}

impl ExportFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "text/html",
            ExportFormat::Excel => "application/vnd.ms-excel",
            ExportFormat::Csv => "text/csv",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "html",
            ExportFormat::Excel => "tsv",
            ExportFormat::Csv => "csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = WebProError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" | "html" => Ok(ExportFormat::Pdf),
            "excel" | "tsv" => Ok(ExportFormat::Excel),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(WebProError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Report identity printed in every export's header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    pub report_name: String,
    pub client_name: String,
    pub date: String,
    pub period: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExportedReport {
    pub format: ExportFormat,
    pub content: String,
}

impl ExportedReport {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

pub fn platform_title(key: &str) -> &str {
    match key {
        "google_ads" => "Google Ads Performance",
        "ga4" => "Google Analytics 4",
        "meta_ads" => "Meta Ads (Facebook/Instagram)",
        "search_console" => "Google Search Console",
        "linkedin" => "LinkedIn Company Page",
        "x_ads" => "X (Twitter) Ads",
        "tiktok_ads" => "TikTok Ads",
        "shopify" => "Shopify Commerce",
        "hubspot" | "hubspot_crm" => "HubSpot CRM",
        "gmb" => "Google Business Profile",
        other => other,
    }
}

pub struct ReportExporter {
    branding: BrandingConfig,
    include_logo: bool,
}

impl ReportExporter {
    pub fn new(branding: BrandingConfig) -> Self {
        Self {
            branding,
            include_logo: true,
        }
    }

    pub fn without_logo(mut self) -> Self {
        self.include_logo = false;
        self
    }

    pub fn export(
        &self,
        meta: &ReportMeta,
        platforms: &BTreeMap<String, Option<PlatformData>>,
        format: ExportFormat,
        generated_at: DateTime<Utc>,
    ) -> ExportedReport {
        let content = match format {
            ExportFormat::Csv => delimited(&table_rows(meta, platforms), ','),
            ExportFormat::Excel => delimited(&table_rows(meta, platforms), '\t'),
            ExportFormat::Pdf => self.html_document(meta, platforms, generated_at),
        };
        ExportedReport { format, content }
    }

    /// Parses `format` first so unknown names surface as errors.
    pub fn export_named(
        &self,
        meta: &ReportMeta,
        platforms: &BTreeMap<String, Option<PlatformData>>,
        format: &str,
        generated_at: DateTime<Utc>,
    ) -> WebProResult<ExportedReport> {
        let format = format.parse()?;
        Ok(self.export(meta, platforms, format, generated_at))
    }

    fn html_document(
        &self,
        meta: &ReportMeta,
        platforms: &BTreeMap<String, Option<PlatformData>>,
        generated_at: DateTime<Utc>,
    ) -> String {
        let color = encode_text(&self.branding.primary_color);
        let mut html = String::new();
        let _ = write!(
            html,
            r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8">
  <title>{report} - {client}</title>
  <style>
    body {{ font-family: Arial, sans-serif; padding: 40px; color: #333; }}
    .header {{ text-align: center; margin-bottom: 40px; border-bottom: 3px solid {color}; padding-bottom: 20px; }}
    .header h1 {{ color: {color}; margin: 0; }}
    .header p {{ color: #666; margin: 5px 0; }}
    .logo {{ max-width: 200px; margin-bottom: 20px; }}
    .section {{ margin: 30px 0; }}
    .section h2 {{ color: #1f2937; border-bottom: 2px solid #e5e7eb; padding-bottom: 10px; }}
    .metrics {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 20px; margin: 20px 0; }}
    .metric-card {{ padding: 15px; background: #f9fafb; border-left: 4px solid {color}; }}
    .metric-card .label {{ font-size: 12px; color: #6b7280; text-transform: uppercase; }}
    .metric-card .value {{ font-size: 24px; font-weight: bold; margin: 5px 0; }}
    .metric-card .change {{ font-size: 14px; color: #10b981; }}
    .footer {{ margin-top: 60px; padding-top: 20px; border-top: 1px solid #e5e7eb; text-align: center; color: #9ca3af; font-size: 12px; }}
  </style>
</head>
<body>
  <div class="header">
"#,
            report = encode_text(&meta.report_name),
            client = encode_text(&meta.client_name),
        );

        if let Some(logo) = self.branding.logo_url.as_deref().filter(|_| self.include_logo) {
            let _ = writeln!(
                html,
                r#"    <img src="{}" alt="Logo" class="logo" />"#,
                encode_double_quoted_attribute(logo)
            );
        }
        let _ = writeln!(html, "    <h1>{}</h1>", encode_text(&meta.report_name));
        let _ = writeln!(
            html,
            "    <p>{} | {}</p>",
            encode_text(&meta.client_name),
            encode_text(&meta.date)
        );
        if let Some(period) = &meta.period {
            let _ = writeln!(html, "    <p>Period: {}</p>", encode_text(period));
        }
        html.push_str("  </div>\n");

        for (key, data) in platforms {
            let Some(data) = data else { continue };
            let _ = writeln!(
                html,
                "  <div class=\"section\">\n    <h2>{}</h2>\n    <div class=\"metrics\">",
                encode_text(platform_title(key))
            );
            for m in &data.metrics {
                let _ = writeln!(
                    html,
                    "      <div class=\"metric-card\"><div class=\"label\">{}</div><div class=\"value\">{}</div><div class=\"change\">{}</div></div>",
                    encode_text(&m.label),
                    encode_text(&m.value),
                    encode_text(&m.change)
                );
            }
            html.push_str("    </div>\n  </div>\n");
        }

        let _ = write!(
            html,
            "  <div class=\"footer\">\n    <p>Generated on {} by {}</p>\n    <p>{}</p>\n    <p>Confidential - For {} Only</p>\n  </div>\n</body>\n</html>\n",
            generated_at.format("%Y-%m-%d"),
            encode_text(&self.branding.company_name),
            encode_text(&self.branding.footer_text),
            encode_text(&meta.client_name),
        );
        html
    }
}

/// Header block then one `Metric,Value,Change,Trend` table per present
/// platform. Empty rows separate the blocks.
fn table_rows(
    meta: &ReportMeta,
    platforms: &BTreeMap<String, Option<PlatformData>>,
) -> Vec<Vec<String>> {
    let mut rows = vec![
        vec!["Report Name".to_string(), meta.report_name.clone()],
        vec!["Client".to_string(), meta.client_name.clone()],
        vec!["Date".to_string(), meta.date.clone()],
    ];
    if let Some(period) = &meta.period {
        rows.push(vec!["Period".to_string(), period.clone()]);
    }

    for (key, data) in platforms {
        let Some(data) = data else { continue };
        rows.push(Vec::new());
        rows.push(vec![platform_title(key).to_string()]);
        rows.push(
            ["Metric", "Value", "Change", "Trend"]
                .map(String::from)
                .to_vec(),
        );
        for m in &data.metrics {
            let trend = serde_json::to_value(m.trend)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            rows.push(vec![m.label.clone(), m.value.clone(), m.change.clone(), trend]);
        }
    }
    rows
}

fn delimited(rows: &[Vec<String>], separator: char) -> String {
    let mut out = String::new();
    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| escape_cell(c, separator)).collect();
        out.push_str(&cells.join(&separator.to_string()));
        out.push('\n');
    }
    out
}

fn escape_cell(cell: &str, separator: char) -> String {
    if separator == '\t' {
        return cell.replace(['\t', '\n'], " ");
    }
    if cell.contains([',', '"', '\n']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use webpro_core::{DataSource, Metric, Platform, Trend};

    fn meta() -> ReportMeta {
        ReportMeta {
            report_name: "Weekly Summary".into(),
            client_name: "Acme Ltd".into(),
            date: "2024-05-06".into(),
            period: Some("weekly".into()),
        }
    }

    fn platforms() -> BTreeMap<String, Option<PlatformData>> {
        let gmb = PlatformData::new(
            Platform::Gmb,
            vec![Metric::new("Profile Views", "2,400", "+8%", Trend::Up)],
            DataSource::Mock,
        );
        BTreeMap::from([
            ("gmb".to_string(), Some(gmb)),
            ("hubspot".to_string(), None),
        ])
    }

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_csv_layout_quotes_separators() {
        let report = ReportExporter::new(BrandingConfig::default()).export(
            &meta(),
            &platforms(),
            ExportFormat::Csv,
            generated_at(),
        );
        let lines: Vec<&str> = report.content.lines().collect();
        assert_eq!(lines[0], "Report Name,Weekly Summary");
        assert_eq!(lines[3], "Period,weekly");
        assert_eq!(lines[5], "Google Business Profile");
        assert_eq!(lines[6], "Metric,Value,Change,Trend");
        assert_eq!(lines[7], "Profile Views,\"2,400\",+8%,up");
        assert!(!report.content.contains("HubSpot"));
        assert_eq!(report.mime_type(), "text/csv");
    }

    #[test]
    fn test_excel_is_tab_separated() {
        let report = ReportExporter::new(BrandingConfig::default()).export(
            &meta(),
            &platforms(),
            ExportFormat::Excel,
            generated_at(),
        );
        assert!(report.content.contains("Profile Views\t2,400\t+8%\tup"));
    }

    #[test]
    fn test_html_carries_branding() {
        let branding = BrandingConfig {
            company_name: "Agency <One>".into(),
            primary_color: "#ff0000".into(),
            logo_url: Some("https://cdn.example/logo.png".into()),
            ..BrandingConfig::default()
        };
        let report = ReportExporter::new(branding).export(
            &meta(),
            &platforms(),
            ExportFormat::Pdf,
            generated_at(),
        );
        let html = &report.content;
        assert!(html.contains("border-bottom: 3px solid #ff0000"));
        assert!(html.contains("https://cdn.example/logo.png"));
        assert!(html.contains("Generated on 2024-05-06 by Agency &lt;One&gt;"));
        assert!(html.contains("<h2>Google Business Profile</h2>"));
        assert!(html.contains("Confidential - For Acme Ltd Only"));
    }

    #[test]
    fn test_html_escapes_text_and_logo_attribute() {
        let branding = BrandingConfig {
            logo_url: Some(r#"https://cdn.example/logo.png" onerror="x"#.into()),
            ..BrandingConfig::default()
        };
        let mut meta = meta();
        meta.client_name = "Smith & <Sons>".into();
        let report = ReportExporter::new(branding).export(
            &meta,
            &platforms(),
            ExportFormat::Pdf,
            generated_at(),
        );
        let html = &report.content;
        assert!(html.contains("Smith &amp; &lt;Sons&gt;"));
        assert!(!html.contains("<Sons>"));
        assert!(html.contains(r#"src="https://cdn.example/logo.png&quot; onerror=&quot;x""#));
    }

    #[test]
    fn test_logo_can_be_suppressed() {
        let branding = BrandingConfig {
            logo_url: Some("https://cdn.example/logo.png".into()),
            ..BrandingConfig::default()
        };
        let report = ReportExporter::new(branding).without_logo().export(
            &meta(),
            &platforms(),
            ExportFormat::Pdf,
            generated_at(),
        );
        assert!(!report.content.contains("<img"));
    }

    #[test]
    fn test_unknown_format_rejected() {
        let exporter = ReportExporter::new(BrandingConfig::default());
        let result = exporter.export_named(&meta(), &platforms(), "docx", generated_at());
        assert!(matches!(result, Err(WebProError::UnsupportedFormat(f)) if f == "docx"));
        assert_eq!("EXCEL".parse::<ExportFormat>().unwrap(), ExportFormat::Excel);
    }
}
