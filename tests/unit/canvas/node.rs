use std::cell::Cell;
use std::rc::Rc;

use super::*;

struct Backend {
    pages: Vec<Page>,
    cleanups: Rc<Cell<usize>>,
}

impl CanvasNode for Backend {
    fn name(&self) -> String {
        "txt(test)".to_string()
    }

    fn create_page(&mut self, size: Size, background: Option<&Path>) -> TokenpressResult<&mut Page> {
        let index = self.pages.len();
        self.pages.push(Page::new(index, size, background));
        Ok(&mut self.pages[index])
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn save(
        &mut self,
        _verbose: bool,
        return_result: bool,
    ) -> TokenpressResult<Option<Vec<Rendered>>> {
        let out = self
            .pages
            .drain(..)
            .map(|p| Rendered::Text(format!("page {}", p.index())))
            .collect();
        Ok(return_result.then_some(out))
    }

    fn cleanup(&mut self) {
        self.cleanups.set(self.cleanups.get() + 1);
    }
}

struct Upper {
    fail: bool,
    seen_sizes: Vec<Size>,
    cleanups: Rc<Cell<usize>>,
}

impl Converter for Upper {
    fn name(&self) -> String {
        "upper".to_string()
    }

    fn convert(
        &mut self,
        inputs: Vec<Rendered>,
        sizes: &[Size],
        _verbose: bool,
        _return_result: bool,
    ) -> TokenpressResult<Option<Vec<Rendered>>> {
        self.seen_sizes = sizes.to_vec();
        if self.fail {
            return Err(TokenpressError::conversion_failed("upper", "exit 1", ""));
        }
        Ok(Some(
            inputs
                .iter()
                .map(|r| Rendered::Text(r.to_text().to_uppercase()))
                .collect(),
        ))
    }

    fn cleanup(&mut self) {
        self.cleanups.set(self.cleanups.get() + 1);
    }
}

fn chain(fail: bool) -> (ConvertNode<Upper>, Rc<Cell<usize>>, Rc<Cell<usize>>) {
    let backend_cleanups = Rc::new(Cell::new(0));
    let converter_cleanups = Rc::new(Cell::new(0));
    let node = ConvertNode::new(
        Box::new(Backend {
            pages: Vec::new(),
            cleanups: backend_cleanups.clone(),
        }),
        Upper {
            fail,
            seen_sizes: Vec::new(),
            cleanups: converter_cleanups.clone(),
        },
    );
    (node, backend_cleanups, converter_cleanups)
}

#[test]
fn pages_reach_the_backend_and_results_flow_outwards() {
    let (mut node, backend_cleanups, converter_cleanups) = chain(false);
    node.create_page(Size::new(10.0, 20.0), None).unwrap();
    node.create_page(Size::new(30.0, 40.0), None).unwrap();
    assert_eq!(node.page_count(), 2);

    let out = node.save(false, true).unwrap().unwrap();
    assert_eq!(
        out,
        vec![
            Rendered::Text("PAGE 0".to_string()),
            Rendered::Text("PAGE 1".to_string())
        ]
    );
    assert_eq!(
        node.converter().seen_sizes,
        vec![Size::new(10.0, 20.0), Size::new(30.0, 40.0)]
    );
    assert_eq!(backend_cleanups.get(), 1);
    assert_eq!(converter_cleanups.get(), 1);
}

#[test]
fn failed_conversion_still_cleans_up_the_whole_chain() {
    let (mut node, backend_cleanups, converter_cleanups) = chain(true);
    node.create_page(Size::new(10.0, 10.0), None).unwrap();
    let err = node.save(false, false).unwrap_err();
    assert!(matches!(err, TokenpressError::ConversionFailed { .. }));
    assert_eq!(backend_cleanups.get(), 1);
    assert_eq!(converter_cleanups.get(), 1);
}

#[test]
fn chain_names_walk_outer_to_inner() {
    let (node, _, _) = chain(false);
    assert_eq!(chain_names(&node), vec!["upper", "txt(test)"]);
    assert_eq!(node.format(), "upper");
}

#[test]
fn name_helpers_split_variant_tags() {
    assert_eq!(base_name("png(resvg)"), "png");
    assert_eq!(base_name("html"), "html");
    assert_eq!(variant_tag("png(resvg)"), Some("resvg"));
    assert_eq!(variant_tag("html"), None);
}

#[test]
fn numbered_outputs_keep_extension() {
    assert_eq!(
        numbered_output(Path::new("out/tokens.png"), 2),
        PathBuf::from("out/tokens_2.png")
    );
    assert_eq!(page_output(Path::new("a.svg"), 0, 1), PathBuf::from("a.svg"));
    assert_eq!(page_output(Path::new("a.svg"), 1, 3), PathBuf::from("a_1.svg"));
}

#[test]
fn several_pages_need_split_pages() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.svg");
    let pages = vec![Rendered::Text("a".into()), Rendered::Text("b".into())];

    let err = write_outputs(&path, &pages, "svg", false).unwrap_err();
    assert!(matches!(err, TokenpressError::UnsupportedMultiPage(_)));
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());

    let written = write_outputs(&path, &pages, "svg", true).unwrap();
    assert_eq!(written.len(), 2);
    assert_eq!(std::fs::read_to_string(&written[1]).unwrap(), "b");
}
