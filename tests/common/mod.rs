#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub const HEADER: &str = "Journal,Field,Publisher,Publisher type,Business model,Institution,Institution type,Country,Website,APC Euros,Scimago Rank,Scimago Quartile,H index,PCI partner";

/// A small journal list touching every category, an unknown APC and one APC above the ceiling.
pub fn sample_csv() -> String {
    let rows = [
        "Cancer Research,Cancer,AACR,Non-profit Society-Run,Hybrid,American Association for Cancer Research,Society,United States,https://aacrjournals.org,\"3,500\",3.1,Q1,400,",
        "Cancer Letters,Cancer,Elsevier,For-profit,Hybrid,,,Netherlands,,\"4,100\",2.4,Q1,250,",
        "ecancermedicalscience,Cancer,ecancer,Non-profit,OA,,,United Kingdom,,,0.4,Q3,40,yes",
        "Plant Cell,Plants,Oxford University Press,University Press Society-Run,Hybrid,American Society of Plant Biologists,Society,United Kingdom,,\"5,200\",4.1,Q1,380,",
        "Peer Community Journal,Plants,Centre Mersenne,Non-profit,OA diamond,,,France,,0,,,,yes",
        "PLOS Biology,Generalist,PLOS,Non-profit,OA,,,United States,,\"5,800\",3.5,Q1,300,",
        "Nature,Generalist,Springer Nature,For-profit,Subscription,,,United Kingdom,,,18.5,Q1,1200,",
        "Open Biology,Generalist,The Royal Society,Non-profit,OA,The Royal Society,Society,United Kingdom,,\"1,700\",1.6,Q1,90,",
    ];
    let mut csv = String::from(HEADER);
    csv.push('\n');
    for row in rows {
        csv.push_str(row);
        csv.push('\n');
    }
    csv
}

/// Write `content` to `dir/name` and return the path.
pub fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("Failed to write test csv");
    path
}
