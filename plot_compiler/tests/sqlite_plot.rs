use plot_compiler::io::{read_delimited_file, write_atomically, DelimitedWriter};
use plot_compiler::render::SvgRenderer;
use plot_compiler::store::{create_plot_database, MemoryStore, SqliteStore};
use plot_compiler::{PlotCompiler, RunConfig};
use rusqlite::{params, Connection};
use tempfile::TempDir;

fn field_database(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("plot.epdb");
    create_plot_database(&path, 1, 4).unwrap();
    let conn = Connection::open(&path).unwrap();
    let update = "UPDATE ncpippn SET circumferences = ?1, reference = ?2, \
                  hdist = ?3, azimuth = ?4 WHERE id = ?5";
    conn.execute(update, params!["31.4", "A0", 5.0, 90.0, "1"]).unwrap();
    conn.execute(update, params!["20;20", "1", 2.0, 0.0, "2"]).unwrap();
    conn.execute(update, params!["", "4", 1.0, 180.0, "3"]).unwrap();
    conn.execute(update, params!["50", "B2", 3.0, 270.0, "4"]).unwrap();
    path
}

#[test]
fn compiles_generated_database() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new().unwrap();
    let db = field_database(&dir);
    let out = dir.path().join("plot.csv");
    let svg = dir.path().join("plot.svg");

    let mut config = RunConfig::new(0.0);
    config.csv_separator = ';';
    config.diameter_scale = 0.01;
    let store = MemoryStore::snapshot(&SqliteStore::open(&db).unwrap()).unwrap();
    let compiler = PlotCompiler::new(config.clone());
    let mut renderer = SvgRenderer::new(&svg);
    let report = write_atomically(&out, |file| {
        let mut writer = DelimitedWriter::new(file, config.csv_separator);
        compiler.compile(&store, &mut writer, Some(&mut renderer))
    })
    .unwrap();

    assert_eq!(report.skipped_anchors, 121);
    assert_eq!(report.rows_written, 4);
    assert_eq!(report.positioned, 4);

    let rows = read_delimited_file(&out, ';').unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0][0], "id");
    // Tree 1: 5 m east of A0 plus half of a 10 cm trunk.
    assert_eq!(rows[1][4], "10.0");
    let x1: f64 = rows[1][9].parse().unwrap();
    assert!((x1 - 5.05).abs() < 1e-9);
    // Tree 4 sits 3 m west of B2, corrected by half its 15.9 cm trunk.
    let x4: f64 = rows[4][9].parse().unwrap();
    let y4: f64 = rows[4][10].parse().unwrap();
    assert!((x4 - (20.0 - 3.0 - 0.5 * 15.9 * 0.01)).abs() < 1e-9);
    assert!((y4 - 10.0).abs() < 1e-9);
    // Tree 3 is stored before tree 4 and chains through it. The stored dbh
    // of tree 4 is empty, so the chained leg carries no trunk correction.
    let x3: f64 = rows[3][9].parse().unwrap();
    let y3: f64 = rows[3][10].parse().unwrap();
    assert!((x3 - 17.0).abs() < 1e-9);
    assert!((y3 - (10.0 - 1.0 - 0.5 * 15.0 * 0.01)).abs() < 1e-9);

    let picture = std::fs::read_to_string(&svg).unwrap();
    assert!(picture.contains("<title>4</title>"));
}

#[test]
fn failed_run_leaves_previous_output() {
    let dir = TempDir::new().unwrap();
    let db = field_database(&dir);
    {
        let conn = Connection::open(&db).unwrap();
        conn.execute("UPDATE ncpippn SET reference = '3' WHERE id = '4'", [])
            .unwrap();
    }
    let out = dir.path().join("plot.csv");
    std::fs::write(&out, "previous").unwrap();

    let store = SqliteStore::open(&db).unwrap();
    let compiler = PlotCompiler::new(RunConfig::new(0.0));
    let res = write_atomically(&out, |file| {
        compiler.compile(&store, &mut DelimitedWriter::new(file, ','), None)
    });
    assert!(matches!(res, Err(plot_compiler::Error::CyclicReference { .. })));
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "previous");
}
