use piece_coordination::{analyze_position, render, AnalysisConfig, Position};
use std::time::Instant;

fn main() {
    let fen = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "2bqr1k1/1p3ppp/p2b1n2/3p4/8/1P2PN2/PB2NPPP/3Q1RK1 b - - 1 17".to_string());
    let position = match Position::from_fen(&fen) {
        Ok(position) => position,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let start = Instant::now();
    let report = analyze_position(&position, &AnalysisConfig::default());
    let elapsed = start.elapsed();

    println!("{}\n", report.fen);
    println!("{}", render::render_heatmap(&report.control));
    println!("Control balance: {:+.3}", report.control.total());
    println!(
        "Coordination: white {:.2}, black {:.2}",
        report.coordination.white, report.coordination.black
    );
    println!(
        "King area defense: white {:.3}, black {:.3}",
        report.king_area_defense.white, report.king_area_defense.black
    );
    println!(
        "Offensive pressure: white {:.3}, black {:.3}",
        report.offensive_pressure.white, report.offensive_pressure.black
    );
    println!("\nAnalysed in {:.2?}", elapsed);
}
