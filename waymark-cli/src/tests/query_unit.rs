//! Unit tests covering query files, output shapes and provider construction.

use std::time::Duration;

use rstest::{fixture, rstest};
use serde_json::json;
use waymark_core::{Distance, DistanceMatrix, LatLng, Route};

use super::helpers::{QueryWorkspace, points, write_utf8};
use crate::CliError;
use crate::output::{MatrixOutput, QueryOutput, RouteOutput};
use crate::provider::{DefaultServiceBuilder, ServiceBuilder};
use crate::query::{
    Operation, Point, ProviderKind, QueryArgs, QueryConfig, QueryFile, QueryInput, load_query,
};

#[fixture]
fn workspace() -> QueryWorkspace {
    QueryWorkspace::new()
}

fn config_for(provider: ProviderKind) -> QueryConfig {
    QueryConfig::try_from(QueryArgs {
        provider: Some(provider),
        distance_source_id: Some(4),
        ..QueryArgs::default()
    })
    .expect("config should build")
}

#[rstest]
fn load_query_decodes_json(workspace: QueryWorkspace) {
    let query = QueryFile {
        origins: points(2),
        location: Some(Point {
            lat: 39.74,
            lng: -104.99,
        }),
        ..QueryFile::default()
    };
    workspace.write_query(&query);

    let decoded = load_query(workspace.query_path()).expect("query should decode");
    assert_eq!(decoded, query);
}

#[rstest]
fn load_query_rejects_invalid_json(workspace: QueryWorkspace) {
    write_utf8(workspace.query_path(), b"{ not valid json");

    let err = load_query(workspace.query_path()).expect_err("invalid json should error");
    match err {
        CliError::ParseQuery { path, .. } => assert_eq!(path, workspace.query_path()),
        other => panic!("expected ParseQuery, found {other:?}"),
    }
}

#[rstest]
fn load_query_io_error_returns_open_error(workspace: QueryWorkspace) {
    let err = load_query(workspace.query_path()).expect_err("missing query should error");
    match err {
        CliError::OpenQuery { path, .. } => assert_eq!(path, workspace.query_path()),
        other => panic!("expected OpenQuery, found {other:?}"),
    }
}

#[rstest]
fn matrix_destinations_default_to_origins(workspace: QueryWorkspace) {
    let query = QueryFile {
        origins: points(3),
        ..QueryFile::default()
    };
    let input = QueryInput::from_file(Operation::Matrix, query, workspace.query_path())
        .expect("matrix input");
    match input {
        QueryInput::Matrix {
            origins,
            destinations,
        } => {
            assert_eq!(origins.len(), 3);
            assert_eq!(origins, destinations);
        }
        other => panic!("expected matrix input, found {other:?}"),
    }
}

#[rstest]
#[case(Operation::Matrix, "origins")]
#[case(Operation::Path, "waypoints")]
#[case(Operation::Route, "waypoints")]
#[case(Operation::Nearest, "location")]
fn empty_query_names_the_missing_field(
    workspace: QueryWorkspace,
    #[case] operation: Operation,
    #[case] expected: &'static str,
) {
    let err = QueryInput::from_file(operation, QueryFile::default(), workspace.query_path())
        .expect_err("empty query should fail");
    match err {
        CliError::IncompleteQuery { command, field, .. } => {
            assert_eq!(command, operation.name());
            assert_eq!(field, expected);
        }
        other => panic!("expected IncompleteQuery, found {other:?}"),
    }
}

#[rstest]
fn query_points_truncate_to_microdegrees(workspace: QueryWorkspace) {
    let query = QueryFile {
        location: Some(Point {
            lat: 39.770_813_989,
            lng: -104.969_438_620,
        }),
        ..QueryFile::default()
    };
    let input = QueryInput::from_file(Operation::Nearest, query, workspace.query_path())
        .expect("nearest input");
    assert_eq!(
        input,
        QueryInput::Nearest(LatLng::from_e6(39_770_813, -104_969_438))
    );
}

#[rstest]
fn matrix_output_lists_cells_in_query_order() {
    let a = LatLng::from_e6(1_000_000, 2_000_000);
    let b = LatLng::from_e6(3_000_000, 4_000_000);
    let matrix: DistanceMatrix = [
        (a, a, Distance::ZERO),
        (a, b, Distance::new(Duration::from_secs(60), 900)),
        (b, a, Distance::new(Duration::from_secs(70), 950)),
        (b, b, Distance::ZERO),
    ]
    .into_iter()
    .collect();

    let output = MatrixOutput::rect(3, &[b, a], &[a], &matrix);
    let value = serde_json::to_value(QueryOutput::Matrix(output)).expect("serialize");

    assert_eq!(
        value,
        json!({
            "distance_source_id": 3,
            "cells": [
                {
                    "origin": {"lat": 3.0, "lng": 4.0},
                    "destination": {"lat": 1.0, "lng": 2.0},
                    "duration_secs": 70,
                    "length_meters": 950
                },
                {
                    "origin": {"lat": 1.0, "lng": 2.0},
                    "destination": {"lat": 1.0, "lng": 2.0},
                    "duration_secs": 0,
                    "length_meters": 0
                }
            ]
        })
    );
}

#[rstest]
fn path_output_covers_consecutive_legs() {
    let path: Vec<LatLng> = points(3).into_iter().map(LatLng::from).collect();
    let matrix = waymark_core::test_support::gen_path_matrix(&path);

    let output = MatrixOutput::path(1, &path, &matrix);
    assert_eq!(output.cells.len(), 2);
    assert_eq!(output.cells[0].origin, Point::from(path[0]));
    assert_eq!(output.cells[1].destination, Point::from(path[2]));
}

#[rstest]
fn route_output_flattens_totals() {
    let a = LatLng::from_e6(1_000_000, 2_000_000);
    let b = LatLng::from_e6(1_500_000, 2_500_000);
    let leg = Distance::new(Duration::from_millis(12_900), 400);
    let route = Route::from_legs(vec![a, b], vec![leg]);

    let value = serde_json::to_value(RouteOutput::from(&route)).expect("serialize");
    assert_eq!(
        value,
        json!({
            "polyline": [{"lat": 1.0, "lng": 2.0}, {"lat": 1.5, "lng": 2.5}],
            "duration_secs": 12,
            "length_meters": 400,
            "legs": [{"duration_secs": 12, "length_meters": 400}]
        })
    );
}

#[rstest]
fn osrm_provider_can_snap() {
    let provider = DefaultServiceBuilder
        .build(&config_for(ProviderKind::Osrm))
        .expect("osrm provider should build");
    assert_eq!(provider.service.distance_source_id(), 4);
    assert!(provider.nearest.is_some());
}

#[rstest]
#[case(ProviderKind::GoogleHttp)]
#[case(ProviderKind::GoogleLegacy)]
fn google_providers_cannot_snap(#[case] kind: ProviderKind) {
    let provider = DefaultServiceBuilder
        .build(&config_for(kind))
        .expect("google provider should build");
    assert_eq!(provider.service.distance_source_id(), 4);
    assert!(provider.nearest.is_none());
}

#[rstest]
#[tokio::test]
async fn grpc_provider_builds_inside_a_runtime() {
    let provider = DefaultServiceBuilder
        .build(&config_for(ProviderKind::GoogleGrpc))
        .expect("grpc provider should build");
    assert_eq!(provider.service.distance_source_id(), 4);
    assert!(provider.nearest.is_none());
}

#[rstest]
fn malformed_grpc_endpoint_is_a_build_error() {
    let mut config = config_for(ProviderKind::GoogleGrpc);
    config.google_url = Some("not a uri".to_owned());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");
    let _guard = runtime.enter();
    let err = DefaultServiceBuilder
        .build(&config)
        .err()
        .expect("malformed endpoint should fail");
    match err {
        CliError::BuildProvider { provider, .. } => assert_eq!(provider, "google-grpc"),
        other => panic!("expected BuildProvider, found {other:?}"),
    }
}
