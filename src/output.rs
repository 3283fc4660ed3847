use std::{
    collections::BTreeSet,
    io::{self, Write},
    str::FromStr,
};

use tabwriter::TabWriter;

use crate::{
    Error, Result,
    category::{NO_CATEGORIES_FOUND, list_categories, list_resource_names},
    error::Aggregate,
    resource::ResourceDescriptor,
    sort::{SortKey, sort_resources},
};

/// Column names of the table view.
pub const TABLE_COLUMNS: [&str; 4] = ["RESOURCE", "APIGROUP", "NAMESPACED", "CATEGORIES"];

/// Shape of the printed result, selected by `--output`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    #[default]
    Table,
    Category,
    Resource,
}

impl FromStr for OutputMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(Self::Table),
            "category" => Ok(Self::Category),
            "resource" => Ok(Self::Resource),
            other => Err(Error::InvalidOutput(other.to_string())),
        }
    }
}

/// A fully computed result, ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Sorted category names; an empty list prints [`NO_CATEGORIES_FOUND`].
    Categories(Vec<String>),
    /// Sorted qualified resource names.
    ResourceNames(Vec<String>),
    /// Sorted resources, one table row each.
    Table {
        rows: Vec<ResourceDescriptor>,
        show_header: bool,
    },
}

impl Projection {
    pub fn build(
        mut resources: Vec<ResourceDescriptor>,
        mode: OutputMode,
        sort_key: SortKey,
        show_header: bool,
    ) -> Self {
        match mode {
            OutputMode::Category => Self::Categories(list_categories(&resources)),
            OutputMode::Resource => Self::ResourceNames(list_resource_names(&resources)),
            OutputMode::Table => {
                sort_resources(&mut resources, sort_key);
                Self::Table {
                    rows: resources,
                    show_header,
                }
            }
        }
    }

    /// Writes the projection to `out`.
    ///
    /// In table mode every row is attempted; failures are collected and returned
    /// together as [`Error::Render`].
    pub fn render<W: Write>(&self, out: &mut W) -> Result<()> {
        match self {
            Self::Categories(categories) if categories.is_empty() => {
                writeln!(out, "{NO_CATEGORIES_FOUND}")?;
            }
            Self::Categories(lines) | Self::ResourceNames(lines) => {
                for line in lines {
                    writeln!(out, "{line}")?;
                }
            }
            Self::Table { rows, show_header } => {
                let aligned = align(&table_lines(rows, *show_header))?;
                let mut errs = Aggregate::default();
                for line in aligned.split_inclusive(|b| *b == b'\n') {
                    if let Err(err) = out.write_all(line) {
                        errs.push(err);
                    }
                }
                if let Err(err) = out.flush() {
                    errs.push(err);
                }
                return errs.into_result();
            }
        }
        Ok(())
    }
}

/// Aligns tab-delimited lines in memory with the spacing kubectl uses for its tables.
///
/// Column widths depend on every row, so alignment finishes before anything reaches the
/// real output.
fn align(lines: &[String]) -> io::Result<Vec<u8>> {
    let mut aligned = Vec::new();
    let mut w = TabWriter::new(&mut aligned).minwidth(6).padding(3);
    for line in lines {
        writeln!(w, "{line}")?;
    }
    w.flush()?;
    drop(w);
    Ok(aligned)
}

/// Tab-delimited table lines, header first unless suppressed.
pub fn table_lines(rows: &[ResourceDescriptor], show_header: bool) -> Vec<String> {
    let header = show_header.then(|| TABLE_COLUMNS.join("\t"));
    header
        .into_iter()
        .chain(rows.iter().map(table_row))
        .collect()
}

fn table_row(resource: &ResourceDescriptor) -> String {
    let categories = resource
        .categories
        .iter()
        .map(String::as_str)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>();
    format!(
        "{}\t{}\t{}\t[{}]",
        resource.name,
        resource.group,
        resource.namespaced,
        categories.join(" ")
    )
}

/// Renders into a string; used where the output is inspected rather than streamed.
pub fn render_to_string(projection: &Projection) -> Result<String> {
    let mut buf = Vec::new();
    projection.render(&mut buf)?;
    String::from_utf8(buf).map_err(|err| Error::Io(io::Error::new(io::ErrorKind::InvalidData, err)))
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};

    use super::{OutputMode, Projection, render_to_string, table_lines};
    use crate::{
        Error, category::NO_CATEGORIES_FOUND, resource::ResourceDescriptor, sort::SortKey,
    };

    fn descriptor(
        name: &str,
        group: &str,
        namespaced: bool,
        categories: &[&str],
    ) -> ResourceDescriptor {
        ResourceDescriptor {
            name: name.into(),
            group: group.into(),
            version: "v1".into(),
            namespaced,
            verbs: vec!["get".into()],
            categories: categories.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn scenario() -> Vec<ResourceDescriptor> {
        vec![
            descriptor("pods", "", true, &["all"]),
            descriptor("deployments", "apps", true, &["all"]),
            descriptor("secrets", "", true, &[]),
        ]
    }

    /// Fails the `fail_on`-th write and accepts every other one.
    struct FlakyWriter {
        fail_on: usize,
        writes: usize,
        received: Vec<u8>,
    }

    impl FlakyWriter {
        fn failing_on(fail_on: usize) -> Self {
            Self {
                fail_on,
                writes: 0,
                received: Vec::new(),
            }
        }
    }

    impl Write for FlakyWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes += 1;
            if self.writes == self.fail_on {
                return Err(io::Error::other("transient"));
            }
            self.received.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn parses_supported_modes_only() {
        assert_eq!("".parse::<OutputMode>().expect("valid"), OutputMode::Table);
        assert_eq!(
            "category".parse::<OutputMode>().expect("valid"),
            OutputMode::Category
        );
        assert_eq!(
            "resource".parse::<OutputMode>().expect("valid"),
            OutputMode::Resource
        );
        let err = "wide".parse::<OutputMode>().expect_err("wide is not supported");
        assert_eq!(err.to_string(), "--output wide is not available");
    }

    #[test]
    fn category_mode() {
        let projection =
            Projection::build(scenario(), OutputMode::Category, SortKey::default(), true);
        assert_eq!(render_to_string(&projection).expect("renders"), "all\n");
    }

    #[test]
    fn category_mode_placeholder() {
        let projection = Projection::build(vec![], OutputMode::Category, SortKey::default(), true);
        assert_eq!(projection, Projection::Categories(vec![]));
        assert_eq!(
            render_to_string(&projection).expect("renders"),
            format!("{NO_CATEGORIES_FOUND}\n")
        );
    }

    #[test]
    fn resource_mode_is_deduplicated_and_qualified() {
        let mut resources = scenario();
        resources.push(descriptor("pods", "", true, &["all"]));
        let projection =
            Projection::build(resources, OutputMode::Resource, SortKey::default(), true);
        assert_eq!(
            render_to_string(&projection).expect("renders"),
            "deployments.apps\npods\nsecrets\n"
        );
    }

    #[test]
    fn table_rows_are_tab_delimited() {
        let rows = vec![descriptor(
            "statefulsets",
            "apps",
            true,
            &["all", "apps", "all"],
        )];
        assert_eq!(
            table_lines(&rows, true),
            [
                "RESOURCE\tAPIGROUP\tNAMESPACED\tCATEGORIES",
                "statefulsets\tapps\ttrue\t[all apps]"
            ]
        );
        assert_eq!(table_lines(&rows, false), ["statefulsets\tapps\ttrue\t[all apps]"]);
    }

    #[test]
    fn table_mode_sorts_and_aligns() {
        let projection = Projection::build(scenario(), OutputMode::Table, SortKey::default(), true);
        let rendered = render_to_string(&projection).expect("renders");
        let lines = rendered.lines().collect::<Vec<_>>();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("RESOURCE"));
        assert!(lines[1].starts_with("pods "));
        assert!(lines[2].starts_with("secrets "));
        assert!(lines[3].starts_with("deployments "));
        assert!(lines[3].ends_with("[all]"));
        assert!(lines[2].ends_with("[]"));
        assert!(!rendered.contains('\t'));
    }

    #[test]
    fn table_without_headers() {
        let projection =
            Projection::build(scenario(), OutputMode::Table, SortKey::Resource, false);
        let rendered = render_to_string(&projection).expect("renders");
        assert!(rendered.starts_with("deployments "));
        assert_eq!(rendered.lines().count(), 3);
    }

    #[test]
    fn failed_row_does_not_stop_later_rows() {
        let rows = (0..5)
            .map(|i| descriptor(&format!("r{i}"), "", true, &[]))
            .collect::<Vec<_>>();
        let projection = Projection::Table {
            rows,
            show_header: true,
        };
        let mut out = FlakyWriter::failing_on(2);

        match projection.render(&mut out) {
            Err(Error::Render(errs)) => {
                assert_eq!(errs.len(), 1);
                assert_eq!(errs.to_string(), "transient");
            }
            other => panic!("expected render error, got {other:?}"),
        }

        let received = String::from_utf8(out.received).expect("output is utf-8");
        let names = received
            .lines()
            .filter_map(|line| line.split_whitespace().next())
            .collect::<Vec<_>>();
        assert_eq!(names, ["RESOURCE", "r1", "r2", "r3", "r4"]);
    }

    #[test]
    fn every_failed_row_is_reported() {
        struct Closed;

        impl Write for Closed {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let projection = Projection::build(scenario(), OutputMode::Table, SortKey::default(), true);
        match projection.render(&mut Closed) {
            Err(Error::Render(errs)) => assert_eq!(errs.len(), 4),
            other => panic!("expected render error, got {other:?}"),
        }
    }
}
