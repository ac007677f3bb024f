mod common;

use qol_core::{
    render_choropleth_svg, Binning, Classification, ColorMode, MapSize, MapView, Overlays,
};

#[test]
fn reference_and_equal_neighbourhood_share_a_colour() -> anyhow::Result<()> {
    let bundle = common::load_fixture_bundle()?;
    let config = common::config();
    let definition = bundle
        .catalog
        .lookup("Social", "Volunteer work")
        .cloned()
        .expect("volunteers indicator");

    for mode in [
        ColorMode::Continuous,
        ColorMode::Discrete {
            classes: 5,
            binning: Binning::EqualInterval,
        },
        ColorMode::Discrete {
            classes: 3,
            binning: Binning::Quantile,
        },
    ] {
        let view = MapView::build(&bundle, &definition, mode, config.map());
        let horsten = &view.neighbourhoods[1];
        let municipality = view.municipality.as_ref().expect("municipality shaded");
        assert_eq!(horsten.value, Some(20.0));
        assert_eq!(horsten.classification, municipality.classification);
        assert_eq!(horsten.color, municipality.color);
        assert_eq!(view.neighbourhoods[3].classification, Classification::NoData);
    }
    Ok(())
}

#[test]
fn discrete_map_spans_lowest_to_highest_class() -> anyhow::Result<()> {
    let bundle = common::load_fixture_bundle()?;
    let config = common::config();
    let definition = bundle
        .catalog
        .lookup("Social", "Volunteer work")
        .cloned()
        .expect("volunteers indicator");
    let mode = ColorMode::Discrete {
        classes: 5,
        binning: Binning::EqualInterval,
    };
    let view = MapView::build(&bundle, &definition, mode, config.map());
    assert_eq!(view.scale.boundaries(), Some(&[10.0, 14.0, 18.0, 22.0, 26.0, 30.0][..]));
    assert_eq!(view.neighbourhoods[0].classification, Classification::Class(4));
    assert_eq!(view.neighbourhoods[2].classification, Classification::Class(0));
    Ok(())
}

#[test]
fn rendered_map_has_one_path_per_neighbourhood() -> anyhow::Result<()> {
    let bundle = common::load_fixture_bundle()?;
    let config = common::config();
    let definition = bundle.catalog.first().cloned().expect("catalog entry");
    let view = MapView::build(&bundle, &definition, ColorMode::Continuous, config.map());
    let svg = render_choropleth_svg(
        &view,
        &bundle,
        config.map(),
        MapSize::FullPage,
        Overlays::default(),
    );

    let start = svg.find(r#"<g id="neighbourhoods">"#).expect("neighbourhood group");
    let end = start + svg[start..].find("</g>").expect("group closes");
    assert_eq!(svg[start..end].matches("<path ").count(), 4);
    assert!(svg.contains("<title>Stadspoort: n/a</title>"));
    assert!(svg.contains(r#"height="1000""#));
    Ok(())
}
