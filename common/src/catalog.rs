//! 病害カタログ
//!
//! 固定の参照レコード5件。予測結果から表示用レコードを解決する際の
//! 第一参照先であり、シミュレーション予測の元データでもある。

use crate::types::{
    join_label, split_label, Alternative, Chemical, CropStatus, DiseaseRecord,
    PredictionReport, PredictionResult, ReportDetails, NOT_AVAILABLE,
};
use std::sync::OnceLock;

/// カタログの1件（参照レコード + シミュレーション時の信頼度）
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub record: DiseaseRecord,
    pub mock_confidence: f64,
}

impl CatalogEntry {
    /// モデル形式のラベル
    pub fn label(&self) -> String {
        join_label(&self.record.crop, &self.record.disease)
    }

    /// このレコードを予測サービスの出力として組み立てる
    pub fn to_prediction(&self) -> PredictionResult {
        let record = &self.record;
        let label = self.label();
        PredictionResult {
            id: record.catalog_id.map(|id| format!("mock-{}", id)),
            label: label.clone(),
            confidence: self.mock_confidence,
            alternatives: vec![Alternative { label, confidence: self.mock_confidence }],
            report: PredictionReport {
                crop: record.crop.clone(),
                disease: record.disease.clone(),
                status: record.status,
                details: ReportDetails {
                    scientific_name: Some(record.scientific_name.clone()),
                    severity: Some(record.severity.clone()),
                    affected_area: Some(record.affected_area.clone()),
                    symptoms: record.symptoms.clone(),
                    remedy: Some(record.remedy.clone()),
                    prevention: Some(record.prevention.clone()),
                    chemicals: record.chemicals.clone(),
                    fertilizer: Some(record.fertilizer.clone()),
                    organic_treatment: Some(record.organic_treatment.clone()),
                    estimated_recovery: Some(record.estimated_recovery.clone()),
                    spread_risk: Some(record.spread_risk.clone()),
                },
                ..Default::default()
            },
        }
    }
}

/// カタログ全件
pub fn entries() -> &'static [CatalogEntry] {
    static CATALOG: OnceLock<Vec<CatalogEntry>> = OnceLock::new();
    CATALOG.get_or_init(build_catalog)
}

/// IDで検索
pub fn find_by_id(id: u32) -> Option<&'static DiseaseRecord> {
    entries()
        .iter()
        .map(|e| &e.record)
        .find(|r| r.catalog_id == Some(id))
}

/// 作物名+病名で検索（大文字小文字・`_` を区別しない）
pub fn find_by_name(crop: &str, disease: &str) -> Option<&'static DiseaseRecord> {
    let crop = normalize_name(crop);
    let disease = normalize_name(disease);
    entries()
        .iter()
        .map(|e| &e.record)
        .find(|r| normalize_name(&r.crop) == crop && normalize_name(&r.disease) == disease)
}

fn normalize_name(name: &str) -> String {
    name.replace('_', " ").trim().to_lowercase()
}

/// 予測結果に対応する病害レコードを解決する
///
/// 1. レポートの作物名+病名でカタログ照合
/// 2. トップラベルを分解してカタログ照合（曖昧時は表示名が "A / B" になるため）
/// 3. どちらも無ければレポートの詳細テキストから合成
pub fn resolve_record(prediction: &PredictionResult) -> DiseaseRecord {
    let report = &prediction.report;

    let matched = find_by_name(&report.crop, &report.disease).or_else(|| {
        let (crop, disease) = split_label(&prediction.label);
        find_by_name(&crop, &disease)
    });

    match matched {
        Some(record) => record.clone(),
        None => synthesize_record(report),
    }
}

fn synthesize_record(report: &PredictionReport) -> DiseaseRecord {
    let details = &report.details;
    let healthy = report.status.is_healthy();
    let text = |value: &Option<String>, fallback: &str| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(fallback)
            .to_string()
    };

    let symptoms = if details.symptoms.is_empty() {
        vec!["No detailed entry available; visual signs may include spots, lesions or discoloration."
            .to_string()]
    } else {
        details.symptoms.clone()
    };

    let default_remedy = if healthy {
        "No action required. Monitor regularly.".to_string()
    } else {
        format!("Treat {} for {}. Follow local extension guidance.", report.crop, report.disease)
    };

    DiseaseRecord {
        catalog_id: None,
        crop: report.crop.clone(),
        disease: report.disease.clone(),
        scientific_name: text(&details.scientific_name, NOT_AVAILABLE),
        status: report.status,
        severity: text(&details.severity, if healthy { "None" } else { "Unknown" }),
        affected_area: text(&details.affected_area, NOT_AVAILABLE),
        symptoms,
        remedy: text(&details.remedy, default_remedy.as_str()),
        prevention: text(&details.prevention, "Maintain crop hygiene, rotation, and monitor regularly."),
        chemicals: details.chemicals.clone(),
        fertilizer: text(&details.fertilizer, NOT_AVAILABLE),
        organic_treatment: text(&details.organic_treatment, NOT_AVAILABLE),
        estimated_recovery: text(&details.estimated_recovery, "Varies by treatment and conditions"),
        spread_risk: text(&details.spread_risk, "Unknown"),
    }
    .with_invariants()
}

fn chem(name: &str, dosage: &str, application: &str) -> Chemical {
    Chemical {
        name: name.to_string(),
        dosage: dosage.to_string(),
        application: application.to_string(),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn build_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry {
            mock_confidence: 94.0,
            record: DiseaseRecord {
                catalog_id: Some(1),
                crop: "Tomato".into(),
                disease: "Early Blight".into(),
                scientific_name: "Alternaria solani".into(),
                status: CropStatus::Diseased,
                severity: "Moderate".into(),
                affected_area: "Leaves and Stems".into(),
                symptoms: strings(&[
                    "Dark brown spots with concentric rings on older leaves",
                    "Yellowing around the spots",
                    "Premature leaf drop",
                    "Stems may show dark lesions",
                ]),
                remedy: "Apply fungicides containing chlorothalonil or mancozeb. Remove infected leaves immediately and destroy them.".into(),
                prevention: "Ensure proper spacing between plants for air circulation. Avoid overhead watering. Use disease-free seeds.".into(),
                chemicals: vec![
                    chem("Chlorothalonil 75% WP", "2g per liter of water", "Spray every 7-10 days"),
                    chem("Mancozeb 75% WP", "2.5g per liter of water", "Apply at first sign of disease"),
                    chem("Azoxystrobin 23% SC", "1ml per liter of water", "Preventive spray every 14 days"),
                ],
                fertilizer: "Use balanced NPK fertilizer (10-10-10). Apply copper-based fungicide as preventive measure.".into(),
                organic_treatment: "Neem oil spray (5ml per liter), Baking soda solution (1 tablespoon per liter)".into(),
                estimated_recovery: "2-3 weeks with proper treatment".into(),
                spread_risk: "High - can spread rapidly in humid conditions".into(),
            },
        },
        CatalogEntry {
            mock_confidence: 89.0,
            record: DiseaseRecord {
                catalog_id: Some(2),
                crop: "Potato".into(),
                disease: "Late Blight".into(),
                scientific_name: "Phytophthora infestans".into(),
                status: CropStatus::Diseased,
                severity: "Severe".into(),
                affected_area: "Leaves, Stems, and Tubers".into(),
                symptoms: strings(&[
                    "Water-soaked spots on leaves that turn brown",
                    "White fungal growth on leaf undersides",
                    "Rapid plant collapse during humid weather",
                    "Tuber infection with brown rot",
                ]),
                remedy: "Apply systemic fungicides containing metalaxyl immediately. Remove and destroy infected plants to prevent spread.".into(),
                prevention: "Plant resistant varieties. Maintain proper drainage and avoid wet conditions. Apply preventive fungicides before symptoms appear.".into(),
                chemicals: vec![
                    chem("Metalaxyl 8% + Mancozeb 64% WP", "2.5g per liter", "Spray every 7 days"),
                    chem("Cymoxanil 8% + Mancozeb 64% WP", "2g per liter", "Apply at disease onset"),
                    chem("Dimethomorph 50% WP", "1g per liter", "Use in rotation with other fungicides"),
                ],
                fertilizer: "Use potassium-rich fertilizer. Apply Bordeaux mixture preventively. Avoid excessive nitrogen.".into(),
                organic_treatment: "Bordeaux mixture (Copper sulfate + lime), Garlic extract spray".into(),
                estimated_recovery: "3-4 weeks, may require replanting in severe cases".into(),
                spread_risk: "Very High - can destroy entire crop in days".into(),
            },
        },
        CatalogEntry {
            mock_confidence: 96.0,
            record: DiseaseRecord {
                catalog_id: Some(3),
                crop: "Corn".into(),
                disease: "Healthy".into(),
                scientific_name: "N/A".into(),
                status: CropStatus::Healthy,
                severity: "None".into(),
                affected_area: "None".into(),
                symptoms: strings(&[
                    "Plant shows no signs of disease",
                    "Healthy green foliage",
                    "Normal growth pattern",
                ]),
                remedy: "No treatment needed. Continue regular care and monitoring.".into(),
                prevention: "Maintain current practices. Monitor regularly for any signs of disease. Ensure proper nutrition and watering.".into(),
                chemicals: vec![],
                fertilizer: "Continue with balanced fertilization schedule. NPK 20-20-20 for vegetative growth.".into(),
                organic_treatment: "Compost tea application monthly for plant health".into(),
                estimated_recovery: "N/A - Plant is healthy".into(),
                spread_risk: "None".into(),
            },
        },
        CatalogEntry {
            mock_confidence: 87.0,
            record: DiseaseRecord {
                catalog_id: Some(4),
                crop: "Rice".into(),
                disease: "Bacterial Leaf Blight".into(),
                scientific_name: "Xanthomonas oryzae".into(),
                status: CropStatus::Diseased,
                severity: "Moderate to Severe".into(),
                affected_area: "Leaves".into(),
                symptoms: strings(&[
                    "Water-soaked lesions on leaf margins",
                    "Lesions turn yellow then white",
                    "Bacterial ooze visible in morning",
                    "Leaf curling and wilting",
                ]),
                remedy: "Apply copper-based bactericides immediately. Remove infected leaves and improve field drainage. Use antibiotics if severe.".into(),
                prevention: "Use disease-free seeds. Avoid excessive nitrogen fertilization. Maintain proper water management.".into(),
                chemicals: vec![
                    chem("Copper Oxychloride 50% WP", "3g per liter", "Spray every 10 days"),
                    chem("Streptocycline (Antibiotic)", "1g per 10 liters", "Apply at first symptom"),
                    chem("Plantomycin", "1g per 10 liters", "Use with copper fungicide"),
                ],
                fertilizer: "Balanced NPK with emphasis on potassium. Apply zinc sulfate if deficient. Reduce nitrogen during infection.".into(),
                organic_treatment: "Pseudomonas fluorescens treatment, Copper-based organic fungicide".into(),
                estimated_recovery: "2-4 weeks depending on severity".into(),
                spread_risk: "High - spreads through water and wind".into(),
            },
        },
        CatalogEntry {
            mock_confidence: 92.0,
            record: DiseaseRecord {
                catalog_id: Some(5),
                crop: "Wheat".into(),
                disease: "Rust (Yellow Rust)".into(),
                scientific_name: "Puccinia striiformis".into(),
                status: CropStatus::Diseased,
                severity: "Moderate".into(),
                affected_area: "Leaves and Stems".into(),
                symptoms: strings(&[
                    "Yellow-orange pustules in stripes on leaves",
                    "Reduced photosynthesis",
                    "Premature leaf death",
                    "Stunted grain development",
                ]),
                remedy: "Apply triazole fungicides. Remove volunteer wheat plants. Use resistant varieties for next planting.".into(),
                prevention: "Plant resistant varieties. Remove alternate hosts. Apply preventive fungicides at tillering stage.".into(),
                chemicals: vec![
                    chem("Propiconazole 25% EC", "1ml per liter", "Spray at first sign"),
                    chem("Tebuconazole 25% EC", "1ml per liter", "Apply every 14 days"),
                    chem("Mancozeb 75% WP", "2g per liter", "Preventive application"),
                ],
                fertilizer: "Balanced NPK. Increase potassium for disease resistance. Apply sulfur-containing fertilizers.".into(),
                organic_treatment: "Sulfur dust application, Neem oil spray with copper".into(),
                estimated_recovery: "3-4 weeks, yield may be affected".into(),
                spread_risk: "High - spreads rapidly through wind-borne spores".into(),
            },
        },
    ]
}
