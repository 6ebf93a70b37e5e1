use std::fs;

use anyhow::Result;
use sqlmarks::app::content::{ContentSource, Extractor};
use sqlmarks::app::parser;
use sqlmarks::app::pipeline::{self, Query, SearchScope};
use sqlmarks::app::resolve::ResolveContext;
use sqlmarks::domain::errors::ContentError;

const EXPORT: &str = r#"<application>
  <component name="BookmarkManager">
    <BookmarkState>
      <option name="url" value="file:///C:/Users/alice/OneDrive%20-%20Acme/sql/orders.sql" />
      <option name="line" value="0" />
      <option name="description" value="Open orders" />
    </BookmarkState>
    <BookmarkState>
      <attributes>
        <entry key="url" value="file://$PROJECT_DIR$/reports/daily.sql" />
        <entry key="line" value="2" />
      </attributes>
      <option name="description" value="Daily totals" />
    </BookmarkState>
  </component>
</application>
"#;

#[test]
fn export_bookmarks_resolve_and_slice() -> Result<()> {
    let home = tempfile::tempdir()?;
    let root = tempfile::tempdir()?;
    let orders = home.path().join("OneDrive - Acme").join("sql").join("orders.sql");
    fs::create_dir_all(orders.parent().expect("parent"))?;
    fs::write(&orders, "select *\nfrom orders\nwhere open;\n")?;
    fs::create_dir_all(root.path().join("reports"))?;
    fs::write(
        root.path().join("reports").join("daily.sql"),
        "-- daily\n\nselect day, sum(total)\nfrom sales\ngroup by day;\n",
    )?;

    let bookmarks = parser::parse(EXPORT)?;
    assert_eq!(bookmarks.len(), 2);

    let extractor = Extractor::new(ResolveContext::new(
        Some(root.path().to_path_buf()),
        Some(home.path().to_path_buf()),
    ));

    let relocated = extractor.content(&bookmarks[0], &bookmarks)?;
    assert_eq!(relocated.text, "select *\nfrom orders\nwhere open;\n");

    let daily = extractor.content(&bookmarks[1], &bookmarks)?;
    assert_eq!(daily.start_line, 3);
    assert!(daily.text.starts_with("select day"));

    let query = Query::new(Some("GROUP BY".into()), SearchScope::Content, None);
    let matched = pipeline::select(&bookmarks, &query, &extractor);
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].description, "Daily totals");
    Ok(())
}

#[test]
fn changing_root_directory_drops_stale_resolutions() -> Result<()> {
    let first = tempfile::tempdir()?;
    let second = tempfile::tempdir()?;
    fs::write(first.path().join("q.sql"), "select 1;\n")?;

    let bookmarks = parser::parse(
        r#"<BookmarkState>
             <option name="url" value="file://$PROJECT_DIR$/q.sql" />
             <option name="line" value="0" />
             <option name="description" value="One" />
           </BookmarkState>"#,
    )?;

    let mut extractor = Extractor::new(ResolveContext::new(Some(first.path().to_path_buf()), None));
    assert_eq!(extractor.content(&bookmarks[0], &bookmarks)?.text, "select 1;\n");

    extractor.set_root_dir(Some(second.path().to_path_buf()));
    let err = extractor
        .content(&bookmarks[0], &bookmarks)
        .expect_err("file only exists under the first root");
    assert!(matches!(err, ContentError::Unresolved { .. }));
    Ok(())
}
