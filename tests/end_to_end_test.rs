mod common;

use chrono::NaiveDate;
use proposal_gen::{
    LocalStorage, ProposalEngine, ProposalError, ProposalPipeline, ProposalRequest, Selection,
    TomlConfig,
};
use tempfile::TempDir;

fn workspace(body: &str) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("kits.csv"), common::DATASET).unwrap();
    std::fs::write(
        temp_dir.path().join("modelo_novo.docx"),
        common::template_docx(body),
    )
    .unwrap();
    temp_dir
}

fn request(kit: &str, plan_images: Vec<String>) -> ProposalRequest {
    ProposalRequest {
        client_name: "Maria Silva".to_string(),
        selections: vec![Selection::new(kit, 1)],
        distance_km: 0.0,
        discount_percent: 5.0,
        plan_images,
    }
}

fn engine(
    temp_dir: &TempDir,
    request: ProposalRequest,
) -> ProposalEngine<ProposalPipeline<LocalStorage, TomlConfig>> {
    let storage = LocalStorage::new(temp_dir.path());
    let pipeline = ProposalPipeline::new(storage, TomlConfig::default(), request)
        .with_date(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
    ProposalEngine::new(pipeline)
}

#[tokio::test]
async fn test_end_to_end_kit_a_proposal() {
    let temp_dir = workspace(concat!(
        r#"<w:p><w:r><w:rPr><w:color w:val="1F4E79"/></w:rPr><w:t>Proposta para {{nome_cliente}}</w:t></w:r></w:p>"#,
        r#"<w:p><w:r><w:t>Valor à vista {{porcentagem_desconto}}: {{valor_avista}}</w:t></w:r></w:p>"#,
        r#"<w:tbl><w:tr>"#,
        r#"<w:tc><w:p><w:r><w:t>{{peso_total}}</w:t></w:r></w:p></w:tc>"#,
        r#"<w:tc><w:p><w:r><w:t>{{frete_normal}}</w:t></w:r></w:p></w:tc>"#,
        r#"</w:tr></w:tbl>"#,
        r#"<w:p><w:r><w:t>Emitida em {{data_atual}}</w:t></w:r></w:p>"#
    ));

    let output_path = engine(&temp_dir, request("Kit A", vec![])).run().await.unwrap();
    assert_eq!(output_path, "propostas_geradas/Proposta_Maria_Silva.docx");

    let docx = temp_dir.path().join(&output_path);
    assert!(docx.exists());

    let xml = common::read_part(&docx, "word/document.xml");
    assert!(xml.contains(r#"<w:b/><w:color w:val="1F4E79"/></w:rPr><w:t xml:space="preserve">Maria Silva</w:t>"#));
    assert!(xml.contains(r#"<w:t xml:space="preserve">R$ 47.500,00</w:t>"#));
    assert!(xml.contains("(5%)"));
    assert!(xml.contains("1000.00 kg"));
    assert!(xml.contains("R$ 1.150,00"));
    assert!(xml.contains("Emitida em "));
    assert!(xml.contains("19/10/2026"));
    assert!(!xml.contains("{{"));

    // 其他部件原封不動
    assert_eq!(common::read_part(&docx, "word/styles.xml"), "<w:styles/>");
}

#[tokio::test]
async fn test_floor_plans_are_capped_at_two() {
    let temp_dir = workspace(r#"<w:p><w:r><w:t>{{nome_cliente}}</w:t></w:r></w:p>"#);
    for (name, width) in [("planta1.png", 1000), ("planta2.png", 500), ("planta3.png", 250)] {
        std::fs::write(temp_dir.path().join(name), common::png(width, 500)).unwrap();
    }
    let plans = ["planta1.png", "planta2.png", "planta3.png"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let output_path = engine(&temp_dir, request("Kit A", plans)).run().await.unwrap();
    let docx = temp_dir.path().join(&output_path);

    let names = common::part_names(&docx);
    assert!(names.contains(&"word/media/image1.png".to_string()));
    assert!(names.contains(&"word/media/image2.png".to_string()));
    assert!(!names.iter().any(|name| name == "word/media/image3.png"));

    let xml = common::read_part(&docx, "word/document.xml");
    assert_eq!(xml.matches("<w:drawing>").count(), 2);
    // 5 吋寬，高度依比例：1000x500 與 500x500
    assert!(xml.contains(r#"cx="4572000" cy="2286000""#));
    assert!(xml.contains(r#"cx="4572000" cy="4572000""#));
    assert!(xml.find("<w:drawing>").unwrap() < xml.find("<w:sectPr>").unwrap());

    let content_types = common::read_part(&docx, "[Content_Types].xml");
    assert_eq!(content_types.matches(r#"Extension="png""#).count(), 1);
    let rels = common::read_part(&docx, "word/_rels/document.xml.rels");
    assert!(rels.contains(r#"Target="media/image1.png""#));
    assert!(rels.contains(r#"Target="media/image2.png""#));
}

#[tokio::test]
async fn test_missing_dataset_column_aborts_without_output() {
    let temp_dir = workspace(r#"<w:p><w:r><w:t>{{nome_cliente}}</w:t></w:r></w:p>"#);
    std::fs::write(
        temp_dir.path().join("kits.csv"),
        "CODIGO,DESCRICAO,PESO UND,A VISTA,LINK_KIT\nK1,Kit A,1,1,x\n",
    )
    .unwrap();

    let err = engine(&temp_dir, request("Kit A", vec![])).run().await.unwrap_err();
    assert!(matches!(err, ProposalError::MissingColumnError { ref column } if column == "AREA"));
    assert!(err.user_friendly_message().starts_with("Erro ao gerar proposta:"));
    assert!(!temp_dir.path().join("propostas_geradas").exists());
}

#[tokio::test]
async fn test_unknown_kit_still_produces_document_with_defaults() {
    let temp_dir = workspace(r#"<w:p><w:r><w:t>{{quant}} x [{{cod_kit}}] {{valor_avista}}</w:t></w:r></w:p>"#);

    let output_path = engine(&temp_dir, request("Kit Z", vec![])).run().await.unwrap();
    let xml = common::read_part(&temp_dir.path().join(&output_path), "word/document.xml");

    assert!(xml.contains("R$ 0,00"));
    assert!(xml.contains(r#"<w:t xml:space="preserve"> x [</w:t>"#));
    assert!(!xml.contains("{{"));
}

#[tokio::test]
async fn test_toml_config_drives_paths() -> anyhow::Result<()> {
    let temp_dir = workspace(r#"<w:p><w:r><w:t>{{descrição_kit}}</w:t></w:r></w:p>"#);
    std::fs::write(
        temp_dir.path().join("kits_ponto_virgula.csv"),
        "CODIGO;DESCRICAO;PESO UND;A VISTA;AREA;LINK_KIT\nK2;Casa Aurora 2Q;2500.5;89900;62,4;http://kits/k2\n",
    )?;

    let config = TomlConfig::from_toml_str(
        r#"
[paths]
dataset = "kits_ponto_virgula.csv"
template = "modelo_novo.docx"
output_dir = "saida"

[dataset]
delimiter = ";"
"#,
    )?;

    let storage = LocalStorage::new(temp_dir.path());
    let pipeline = ProposalPipeline::new(storage, config, request("Casa Aurora 2Q", vec![]));
    let output_path = ProposalEngine::new(pipeline).run().await?;

    assert_eq!(output_path, "saida/Proposta_Maria_Silva.docx");
    let xml = common::read_part(&temp_dir.path().join(&output_path), "word/document.xml");
    assert!(xml.contains("Casa Aurora 2Q"));
    Ok(())
}

#[tokio::test]
async fn test_blank_cells_in_unselected_row_do_not_block_generation() {
    let temp_dir = workspace(r#"<w:p><w:r><w:t>{{valor_avista}}</w:t></w:r></w:p>"#);
    std::fs::write(
        temp_dir.path().join("kits.csv"),
        format!("{}K9,Kit Novo,,,,http://kits/k9\n", common::DATASET),
    )
    .unwrap();

    let output_path = engine(&temp_dir, request("Kit A", vec![])).run().await.unwrap();
    let xml = common::read_part(&temp_dir.path().join(&output_path), "word/document.xml");
    assert!(xml.contains("R$ 47.500,00"));
}
