//! End-to-end tests for reading, editing and writing feature files.
#![expect(clippy::expect_used, reason = "tests use fixed fixtures")]

use qcumber_document::{
    Document, FeatureReader, FeatureWriter, Node, NodeId, NodeKind, RunTagSelection, Table,
};
use qcumber_patterns::{DefinitionParser, PatternSet};
use rstest::{fixture, rstest};

const BASKET: &str = "\
# Shopping basket behaviour
@smoke
Feature: Basket
  Customers fill a basket before checkout.

  Background:
    Given an empty basket

  # The common case
  @fast
  Scenario: Adding cucumbers
    When I add 3 cucumbers
    Then the basket holds
      | item     | count |
      | cucumber | 3     |

  Scenario: Removing cucumbers
    Given I have 2 cucumbers
    # nothing left afterwards
    When I remove 2 cucumbers
";

#[fixture]
fn basket() -> (Document, NodeId) {
    let (doc, read) = FeatureReader::default().read(BASKET).expect("basket reads");
    assert!(read.warnings.is_empty(), "unexpected warnings: {:?}", read.warnings);
    (doc, read.feature)
}

#[rstest]
fn canonical_text_round_trips(basket: (Document, NodeId)) {
    let (doc, feature) = basket;
    let written = FeatureWriter::default()
        .write_feature(&doc, feature)
        .expect("basket writes");
    assert_eq!(written, BASKET);
}

#[rstest]
fn scenario_export_includes_feature_context(basket: (Document, NodeId)) {
    let (doc, feature) = basket;
    let scenario = doc
        .children(feature)
        .iter()
        .copied()
        .find(|id| doc.node(*id).is_some_and(|n| n.title() == "Removing cucumbers"))
        .expect("scenario present");
    let text = FeatureWriter::default()
        .write_node(&doc, scenario)
        .expect("scenario writes");
    assert_eq!(
        text,
        "\
# Shopping basket behaviour
@smoke
Feature: Basket

  Background:
    Given an empty basket

  Scenario: Removing cucumbers
    Given I have 2 cucumbers
    # nothing left afterwards
    When I remove 2 cucumbers
"
    );
}

#[test]
fn two_by_two_table_is_padded() {
    let mut doc = Document::new();
    let feature = doc.add_feature(Node::feature("Tables")).expect("feature");
    let scenario = doc
        .add_child(feature, Node::scenario("Widths"), None)
        .expect("scenario");
    let step = doc
        .add_child(scenario, Node::step("Given a table"), None)
        .expect("step");
    let mut table = Table::default();
    table.set_cell(0, 0, "a").expect("cell");
    table.set_cell(0, 1, "bb").expect("cell");
    table.set_cell(1, 1, "ccc").expect("cell");
    doc.set_table(step, Some(table)).expect("table");

    let text = FeatureWriter::default()
        .write_node(&doc, step)
        .expect("step writes");
    assert_eq!(text, "    Given a table\n      | a | bb  |\n      |   | ccc |\n");
}

#[rstest]
fn imported_patterns_mark_steps(basket: (Document, NodeId)) {
    let (mut doc, feature) = basket;
    let patterns: PatternSet = DefinitionParser::default()
        .parse_source(
            "basket_steps.rb",
            "Given /^I have (\\d+) cucumbers$/ do |n|\nend\nWhen /^I (add|remove) (\\d+) cucumbers$/ do |op, n|\nend\n",
        )
        .into();
    assert_eq!(doc.rematch_all(&patterns), 3);

    let unmatched: Vec<_> = doc
        .steps(feature)
        .into_iter()
        .filter_map(|id| doc.node(id))
        .filter(|node| !node.is_matched())
        .map(|node| node.title().to_string())
        .collect();
    assert_eq!(unmatched, ["Given an empty basket", "Then the basket holds"]);
}

#[rstest]
fn tags_feed_run_selection(basket: (Document, NodeId)) {
    let (doc, _) = basket;
    let mut selection = RunTagSelection::new();
    for tag in doc.defined_tags() {
        selection.toggle(&tag);
    }
    selection.toggle("@fast");
    assert_eq!(selection.to_string(), "~@fast @smoke");
}

#[rstest]
fn edits_survive_a_round_trip(basket: (Document, NodeId)) {
    let (mut doc, feature) = basket;
    let scenario = doc
        .children(feature)
        .iter()
        .copied()
        .find(|id| doc.node(*id).is_some_and(|n| n.kind() == NodeKind::Scenario))
        .expect("scenario");
    let copy = doc.duplicate_subtree(scenario).expect("duplicate");
    doc.set_title(copy, "Adding more cucumbers").expect("title");
    doc.add_tag(copy, "wip").expect("tag");

    let writer = FeatureWriter::default();
    let text = writer.write_feature(&doc, feature).expect("write");
    let (reread, read) = FeatureReader::default().read(&text).expect("reread");
    assert_eq!(writer.write_feature(&reread, read.feature).expect("rewrite"), text);
    assert!(text.contains("  @fast @wip\n  Scenario: Adding more cucumbers\n"));
}
