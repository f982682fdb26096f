//! The `dotpoint init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("dotpoint.toml").exists() {
        println!("dotpoint.toml already exists, skipping.");
    } else {
        std::fs::write("dotpoint.toml", SAMPLE_CONFIG)?;
        println!("Created dotpoint.toml");
    }

    std::fs::create_dir_all("data")?;
    let example_path = std::path::Path::new("data/example.csv");
    if example_path.exists() {
        println!("data/example.csv already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_BANK)?;
        println!("Created data/example.csv");
    }

    println!("\nNext steps:");
    println!("  1. Set spreadsheet_id and credentials in dotpoint.toml");
    println!("  2. Run: dotpoint validate data/example.csv");
    println!("  3. Run: dotpoint sync --mode overwrite");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# dotpoint configuration

spreadsheet_id = "${DOTPOINT_SPREADSHEET_ID}"
credentials = "service-account.json"

[[files]]
path = "data/example.csv"
tab = "Example"
"#;

const EXAMPLE_BANK: &str = r#"subject,moduleId,dotPointId,tabName,question,options,correctAnswer,explanation,difficulty,time_limit,points,syllabus_outcome,keywords,status
Biology,bio-m5,bio-m5-dp1,Example,"Which process produces gametes, halving the chromosome number?",Mitosis|Meiosis|Binary fission|Budding,Meiosis,Meiosis produces four haploid cells.,easy,60,10,BIO11/12-1,"meiosis,gametes",active
Chemistry,chem-m6,chem-m6-dp2,Example,Define a Bronsted-Lowry acid.,,A proton donor.,,medium,90,10,CH12-13,"acid,proton",active
"#;
