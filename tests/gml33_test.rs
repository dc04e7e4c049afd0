use gml_decode::gml32::PosList;
use gml_decode::gml33::ReferenceableGridByArray;
use gml_decode::profile::{GML32_NAMESPACE, GML33_NAMESPACE};
use gml_decode::{decode, gml32_profiles, gml33_profiles, Decode, Decoder, Element, Gml, GmlError};

fn xml_template(content: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<root xmlns:gml="http://www.opengis.net/gml/3.2" xmlns:gmlrgrid="http://www.opengis.net/gml/3.3/rgrid" xmlns:gml33="http://www.opengis.net/gml/3.3">
{content}
</root>"#
    )
}

fn first_child(xml: &str) -> Element {
    let root = Element::parse_str(xml).expect("valid test document");
    root.children()[0].clone()
}

const GRID_2D: &str = r#"
        <gmlrgrid:ReferenceableGridByArray gml:id="ex" dimension="2"
            srsName="http://www.opengis.net/def/crs/EPSG/0/4326">
            <gml:limits>
                <gml:GridEnvelope>
                    <gml:low>0 0</gml:low>
                    <gml:high>4 5</gml:high>
                </gml:GridEnvelope>
            </gml:limits>
            <gml:axisLabels>x y</gml:axisLabels>
            <gml:posList>
            2 8 3 10 6 12 8 14 10 18
            4 6 6 8 8 12 10 14 12 16
            6 2 7 4 9 6 10 8 13 12
            8 2 8 3 10 5 11 8 13 10
            </gml:posList>
            <gml:sequenceRule axisOrder="+1 +2">Linear</gml:sequenceRule>
        </gmlrgrid:ReferenceableGridByArray>"#;

fn grid_3d(axis_order: &str) -> String {
    format!(
        r#"<gml:ReferenceableGridByArray gml:id="6d-SO_t" dimension="3" uomLabels="DMSH DMSH metre" srsDimension="3"
           srsName="EPSG/0/4327">
            <gml:limits>
              <gml:GridEnvelope>
                <gml:low>0 0 0</gml:low>
                <gml:high>3 4 2</gml:high>
              </gml:GridEnvelope>
            </gml:limits>
            <gml:axisLabels>two 1 3</gml:axisLabels>
            <gml:posList>
              40   9.2 200   40.1 9.3 200   40.3 9.5 210
              40.1 9.3 205   40.3 9.5 220   40.4 9.7 225
              40.4 9.4 215   40.7 9.7 225   40.8 9.8 235
              40.6 9.5 220   40.8 9.7 230   40.9 9.9 240

              40.0 9.1 205   40.1 9.2 210   40.4 9.6 230
              40.2 9.5 220   40.2 9.4 240   40.7 9.7 240
              40.5 9.7 225   40.5 9.6 245   40.8 9.8 285
              40.7 9.8 230   40.6 9.8 290   41   10  295
            </gml:posList>
            <gml:sequenceRule axisOrder="{axis_order}">Linear</gml:sequenceRule>
          </gml:ReferenceableGridByArray>"#
    )
}

fn decode_grid(content: &str) -> ReferenceableGridByArray {
    let element = first_child(&xml_template(content));
    ReferenceableGridByArray::decode(&element, &gml32_profiles()).expect("grid decodes")
}

#[test]
fn test_referenceable_grid_attributes() {
    let grid = decode_grid(GRID_2D);
    assert_eq!(grid.grid.limits.highs, vec![4, 5]);
    assert_eq!(grid.grid.axes, vec!["x", "y"]);
    assert_eq!(grid.grid.dims, 2);
    assert_eq!(grid.grid.attrs["gml:id"], "ex");
    assert_eq!(
        grid.pos_list.values[..12],
        [2.0, 8.0, 3.0, 10.0, 6.0, 12.0, 8.0, 14.0, 10.0, 18.0, 4.0, 6.0]
    );
    assert_eq!(grid.sequence_rule.axis_order, "+1 +2");
    assert_eq!(grid.sequence_rule.rule, "Linear");
}

#[test]
fn test_axis_arrays_2d() {
    let arrays = decode_grid(GRID_2D).axis_arrays().unwrap();
    assert_eq!(arrays.keys().collect::<Vec<_>>(), vec!["x", "y"]);
    assert_eq!(arrays["x"].shape(), &[1, 5]);
    assert_eq!(arrays["y"].shape(), &[4, 1]);
    assert_eq!(
        arrays["x"].iter().copied().collect::<Vec<_>>(),
        vec![2.0, 10.0, 10.0, 9.0, 8.0]
    );
    assert_eq!(
        arrays["y"].iter().copied().collect::<Vec<_>>(),
        vec![8.0, 10.0, 12.0, 14.0]
    );
}

#[test]
fn test_axis_arrays_3d_column_major() {
    let arrays = decode_grid(&grid_3d("+2 +1 +3")).axis_arrays().unwrap();
    assert_eq!(arrays["1"].shape(), &[1, 4, 1]);
    assert_eq!(
        arrays["1"].iter().copied().collect::<Vec<_>>(),
        vec![9.2, 9.3, 9.4, 9.5]
    );
    assert_eq!(arrays["two"].shape(), &[1, 1, 2]);
    assert_eq!(
        arrays["two"].iter().copied().collect::<Vec<_>>(),
        vec![40.0, 40.0]
    );
    assert_eq!(arrays["3"].shape(), &[3, 1, 1]);
    assert_eq!(
        arrays["3"].iter().copied().collect::<Vec<_>>(),
        vec![200.0, 200.0, 210.0]
    );
}

#[test]
fn test_axis_arrays_layout_ignores_axis_order() {
    let linear = decode_grid(&grid_3d("+1 +2 +3")).axis_arrays().unwrap();
    let swapped = decode_grid(&grid_3d("+2 +1 +3")).axis_arrays().unwrap();
    assert_eq!(linear, swapped);
}

#[test]
fn test_axis_arrays_infer_shape_from_distinct_values() {
    let grid = decode_grid(
        r#"<gml:ReferenceableGridByArray dimension="2">
            <gml:limits><gml:GridEnvelope><gml:low>0 0</gml:low><gml:high>9 9</gml:high></gml:GridEnvelope></gml:limits>
            <gml:axisLabels>x y</gml:axisLabels>
            <gml:posList>10 1 10 2 20 1 20 2 30 1 30 2</gml:posList>
            <gml:sequenceRule axisOrder="+1 +2">Linear</gml:sequenceRule>
        </gml:ReferenceableGridByArray>"#,
    );
    let arrays = grid.axis_arrays().unwrap();
    assert_eq!(arrays["x"].shape(), &[1, 3]);
    assert_eq!(
        arrays["x"].iter().copied().collect::<Vec<_>>(),
        vec![10.0, 20.0, 30.0]
    );
    assert_eq!(arrays["y"].shape(), &[2, 1]);
    assert_eq!(
        arrays["y"].iter().copied().collect::<Vec<_>>(),
        vec![1.0, 2.0]
    );
}

#[test]
fn test_axis_arrays_irregular_grid_shape_error() {
    let grid = decode_grid(
        r#"<gml:ReferenceableGridByArray dimension="2">
            <gml:limits><gml:GridEnvelope><gml:low>0 0</gml:low><gml:high>9 9</gml:high></gml:GridEnvelope></gml:limits>
            <gml:axisLabels>x y</gml:axisLabels>
            <gml:posList>10 1 11 2 20 3 21 4</gml:posList>
            <gml:sequenceRule axisOrder="+1 +2">Linear</gml:sequenceRule>
        </gml:ReferenceableGridByArray>"#,
    );
    assert!(matches!(grid.axis_arrays(), Err(GmlError::GridShape(_))));
}

#[test]
fn test_only_linear_sequence_rule_is_supported() {
    let mut grid = decode_grid(GRID_2D);
    grid.sequence_rule.rule = "Boustrophedonic".to_string();
    let result = grid.axis_arrays();
    assert!(matches!(
        result,
        Err(GmlError::UnsupportedSequenceRule(rule)) if rule == "Boustrophedonic"
    ));
}

#[test]
fn test_gml33_profile_resolves_rgrid_namespace() {
    let element = first_child(&xml_template(GRID_2D));
    let decoded = decode(&element, &gml33_profiles()).unwrap();
    assert_eq!(decoded.decoder(), Decoder::ReferenceableGridByArray);

    // GML 3.2 alone does not know about referenceable grids.
    assert!(matches!(
        decode(&element, &gml32_profiles()),
        Err(GmlError::UnsupportedTag(_))
    ));
}

#[test]
fn test_gml33_aliases_decode_as_gml32_types() {
    let element = first_child(&xml_template(
        r#"<gml33:domainSet>
            <gml33:Point gml:id="p33"><gml:coordinates>10 20</gml:coordinates></gml33:Point>
        </gml33:domainSet>"#,
    ));
    assert_eq!(
        element.tag(),
        format!("{{{GML33_NAMESPACE}}}domainSet")
    );
    let decoded = decode(&element, &gml33_profiles()).unwrap();
    let Gml::Point(point) = decoded else {
        panic!("expected a Point");
    };
    assert_eq!(point.coords, vec![10.0, 20.0]);
    assert_eq!(point.attrs["gml:id"], "p33");
}

#[test]
fn test_gml33_envelope_alias() {
    let element = first_child(&xml_template(
        r#"<gml33:Envelope srsName="CRS:84">
            <gml:lowerCorner>0 1</gml:lowerCorner>
            <gml:upperCorner>2 3</gml:upperCorner>
        </gml33:Envelope>"#,
    ));
    let Gml::Envelope(envelope) = decode(&element, &gml33_profiles()).unwrap() else {
        panic!("expected an Envelope");
    };
    assert_eq!(envelope.lows, vec![0.0, 1.0]);
    assert_eq!(envelope.highs, vec![2.0, 3.0]);
    assert!(element
        .children()
        .iter()
        .all(|c| c.tag().starts_with(&format!("{{{GML32_NAMESPACE}}}"))));
}

fn grid_2d(highs: &str, pos_list: &str) -> ReferenceableGridByArray {
    decode_grid(&format!(
        r#"<gml:ReferenceableGridByArray dimension="2">
            <gml:limits><gml:GridEnvelope><gml:low>0 0</gml:low><gml:high>{highs}</gml:high></gml:GridEnvelope></gml:limits>
            <gml:axisLabels>x y</gml:axisLabels>
            <gml:posList>{pos_list}</gml:posList>
            <gml:sequenceRule axisOrder="+1 +2">Linear</gml:sequenceRule>
        </gml:ReferenceableGridByArray>"#
    ))
}

#[test]
fn test_axis_arrays_empty_pos_list() {
    let grid = grid_2d("4 5", "");
    assert!(grid.pos_list.values.is_empty());
    assert!(matches!(grid.axis_arrays(), Err(GmlError::GridShape(_))));

    let mut grid = decode_grid(&grid_3d("+1 +2 +3"));
    grid.pos_list = PosList {
        attrs: Default::default(),
        values: Vec::new(),
    };
    assert!(matches!(grid.axis_arrays(), Err(GmlError::GridShape(_))));
}

#[test]
fn test_axis_arrays_pos_list_not_multiple_of_axes() {
    let grid = grid_2d("3 1", "10 1 20 2 30");
    assert!(matches!(
        grid.axis_arrays(),
        Err(GmlError::Construction {
            entity: "ReferenceableGridByArray",
            ..
        })
    ));
}

#[test]
fn test_axis_arrays_highs_count_differs_from_axes() {
    // Three highs with a matching product are still not a shape for two axes.
    let grid = grid_2d("2 2 1", "10 1 11 2 20 3 21 4");
    assert_eq!(grid.grid.limits.highs.len(), 3);
    assert!(matches!(grid.axis_arrays(), Err(GmlError::GridShape(_))));
}

#[test]
fn test_axis_arrays_huge_highs_fall_back() {
    let grid = grid_2d("4294967296 4294967296", "10 1 10 2 20 1 20 2 30 1 30 2");
    let arrays = grid.axis_arrays().unwrap();
    assert_eq!(arrays["x"].shape(), &[1, 3]);
    assert_eq!(arrays["y"].shape(), &[2, 1]);

    let grid = decode_grid(&grid_3d("+1 +2 +3").replace(
        "<gml:high>3 4 2</gml:high>",
        "<gml:high>4294967296 4294967296 2</gml:high>",
    ));
    assert!(matches!(grid.axis_arrays(), Err(GmlError::GridShape(_))));
}

#[test]
fn test_pos_list_split_by_comment() {
    let element = first_child(&xml_template(
        "<gml:posList>1 2<!-- second pair -->3 4</gml:posList>",
    ));
    let pos_list = PosList::decode(&element, &gml32_profiles()).unwrap();
    assert_eq!(pos_list.values, vec![1.0, 2.0, 3.0, 4.0]);
}
