use exam_grader::config::{Config, GradingConfig};
use exam_grader::models::loaders::parse_document;
use exam_grader::models::loaders::document_loader::DocumentFormat;
use exam_grader::models::{MissingCause, PlausibilityStatus};
use exam_grader::{evaluate, evaluate_concurrent, App, DecimalSeparator, GradingTable, ScanDocument};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

/// 两个学生、各两页的检测文档
fn exam_json() -> serde_json::Value {
    json!({
        "name": "exam_a",
        "pages": [
            { "page": 1, "records": [
                { "label": "Mat_num", "candidates": [["Matrikelnr: 100200", 0.95]], "bbox": [20, 20, 300, 60] },
                { "label": "seat_num", "candidates": [["Platz: 7", 0.9]], "bbox": [400, 20, 500, 60] },
                { "label": "question_num", "candidates": [["1.Frage Grundlagen (4 Punkte)", 0.9]], "bbox": [20, 200, 800, 240] },
                { "label": "grades", "candidates": [["35", 0.8], ["3S", 0.4]], "bbox": [900, 500, 960, 540] },
                { "label": "page_number", "candidates": [["Seite 1 von 2", 0.9]], "bbox": [400, 1600, 600, 1630] }
            ]},
            { "page": 2, "records": [
                { "label": "question_num", "candidates": [["2.Frage SQL (6 Punkte)", 0.9]], "bbox": [20, 100, 800, 140] },
                { "label": "grades", "candidates": [["6", 0.85]], "bbox": [900, 700, 960, 740] },
                { "label": "page_number", "candidates": [["Seite 2 von 2", 0.9]], "bbox": [400, 1600, 600, 1630] }
            ]},
            { "page": 3, "records": [
                { "label": "Mat_num", "candidates": [["Matrikelnr: 1OO3OO", 0.7]], "bbox": [20, 20, 300, 60] },
                { "label": "question_num", "candidates": [["1.Frage Grundlagen (4 Punkte)", 0.9]], "bbox": [20, 200, 800, 240] },
                { "label": "grades", "candidates": [["2", 0.9]], "bbox": [900, 500, 960, 540] },
                { "label": "page_number", "candidates": [["Seite 1 von 2", 0.9]], "bbox": [400, 1600, 600, 1630] }
            ]},
            { "page": 4, "records": [
                { "label": "question_num", "candidates": [["2.Frage SQL (6 Punkte)", 0.9]], "bbox": [20, 100, 800, 140] },
                { "label": "logo", "candidates": [["Hochschule", 0.99]], "bbox": [0, 0, 10, 10] }
            ]}
        ]
    })
}

fn exam_document() -> ScanDocument {
    parse_document(&exam_json().to_string(), DocumentFormat::Json, Path::new("exam_a.json"))
        .expect("解析检测文档失败")
}

#[test]
fn test_evaluate_two_students() {
    let document = exam_document();
    let evaluation = evaluate(&document.pages, &GradingConfig::default());

    assert_eq!(evaluation.students.len(), 2);

    let first = &evaluation.students[0];
    assert_eq!(first.pages, vec![1, 2]);
    assert_eq!(first.seat_number.normalized.as_deref(), Some("7"));
    assert_eq!(first.questions[&1].achieved_text, "3,5");
    assert_eq!(first.questions[&2].status, PlausibilityStatus::Full);
    assert_eq!(first.achieved_total, 9.5);
    assert_eq!(first.final_grade, "1,0");
    assert!(first.passed);
    assert!(first.issues.is_empty(), "{:?}", first.issues);

    let second = &evaluation.students[1];
    assert_eq!(second.pages, vec![3, 4]);
    assert_eq!(second.matriculation_number.normalized.as_deref(), Some("100300"));
    assert!(second.matriculation_number.changed);
    assert_eq!(second.questions[&2].status, PlausibilityStatus::NoMatch);
    assert_eq!(second.page_health.missing, vec![2]);
    assert_eq!(second.page_health.missing_cause, Some(MissingCause::Recognizer));
    assert_eq!(second.final_grade, "5,0");
    assert!(!second.passed);

    assert_eq!(
        evaluation.issues,
        vec![
            "Student 2 (100300): Matriculation number normalized: '1OO3OO'",
            "Student 2 (100300): Seat number invalid: ''",
            "Student 2 (100300): 2: no grade detected",
            "Student 2 (100300): Page check: OCR failed to extract page markers for: [2]",
        ]
    );

    let distribution: Vec<(String, usize)> = evaluation
        .grade_distribution
        .iter()
        .map(|g| (g.grade.clone(), g.count))
        .collect();
    assert_eq!(distribution, vec![("1,0".to_string(), 1), ("5,0".to_string(), 1)]);
}

#[test]
fn test_evaluate_without_matnum_is_one_group() {
    let mut document = exam_document();
    for page in &mut document.pages {
        page.records.retain(|r| r.label != exam_grader::models::Label::MatriculationNumber);
    }
    let evaluation = evaluate(&document.pages, &GradingConfig::default());

    assert_eq!(evaluation.students.len(), 1);
    assert_eq!(evaluation.students[0].pages, vec![1, 2, 3, 4]);
    // 重复的题号保留第一次出现
    assert!(evaluation.students[0]
        .issues
        .contains(&"1: duplicate question header on page 3 ignored".to_string()));
}

#[test]
fn test_custom_grading_scheme() {
    let config = GradingConfig {
        grading_table: GradingTable::new(vec![
            exam_grader::GradeThreshold::new(0.0, "fail"),
            exam_grader::GradeThreshold::new(90.0, "excellent"),
        ])
        .unwrap(),
        decimal_separator: DecimalSeparator::Dot,
        ..Default::default()
    };
    let evaluation = evaluate(&exam_document().pages, &config);

    assert_eq!(evaluation.students[0].questions[&1].achieved_text, "3.5");
    assert_eq!(evaluation.students[0].final_grade, "excellent");
    assert_eq!(evaluation.students[1].final_grade, "fail");
}

#[test]
fn test_default_table_boundaries() {
    let table = GradingTable::default();
    assert_eq!(DecimalSeparator::Comma.apply(table.lookup(54.9)), "4,0");
    assert_eq!(table.lookup(55.0), "3.7");
}

#[tokio::test]
async fn test_concurrent_evaluation_keeps_order() {
    let document = exam_document();
    let config = Arc::new(GradingConfig::default());
    let sequential = evaluate(&document.pages, &config);
    let concurrent = evaluate_concurrent(document.pages, config).await;

    assert_eq!(concurrent, sequential);
}

#[tokio::test]
async fn test_app_writes_results() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("detections");
    let output = dir.path().join("processed_results");
    let log_file = dir.path().join("grading_log.txt");
    std::fs::create_dir_all(&input).unwrap();
    std::fs::write(input.join("exam_a.json"), exam_json().to_string()).unwrap();

    let config = Config {
        input_folder: input.to_string_lossy().to_string(),
        output_folder: output.to_string_lossy().to_string(),
        max_concurrent_documents: 2,
        verbose_logging: false,
        output_log_file: log_file.to_string_lossy().to_string(),
        grading_config_file: None,
    };

    let stats = App::initialize(config).await.unwrap().run().await.unwrap();
    assert_eq!(stats.success, 1);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.students, 2);
    assert_eq!(stats.issues, 4);

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(output.join("exam_a.result.json")).unwrap())
            .unwrap();
    assert_eq!(report["document"], "exam_a");
    assert_eq!(report["students"].as_array().unwrap().len(), 2);
    assert_eq!(report["students"][0]["final_grade"], "1,0");
    assert_eq!(report["students"][1]["questions"]["2"]["status"], "no_match");

    let log = std::fs::read_to_string(&log_file).unwrap();
    assert!(log.contains("文档 exam_a | Student 2 (100300): 2: no grade detected"));
}

#[tokio::test]
async fn test_app_with_empty_input_folder() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in");
    std::fs::create_dir_all(&input).unwrap();

    let config = Config {
        input_folder: input.to_string_lossy().to_string(),
        output_folder: dir.path().join("out").to_string_lossy().to_string(),
        output_log_file: dir.path().join("log.txt").to_string_lossy().to_string(),
        ..Config::default()
    };

    let stats = App::initialize(config).await.unwrap().run().await.unwrap();
    assert_eq!(stats.total, 0);
}
