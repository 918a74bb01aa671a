//! Integration tests editing TypeScript files on disk

use monux_core::{FileStatus, SourceFile};
use monux_tsedit::{OpaqueExpressions, TsCodec, TsValue, splice};
use std::fs;
use tempfile::TempDir;

const APP_CONFIG: &str = "\
import { ApplicationConfig } from '@angular/core';
import { provideRouter } from '@angular/router';

import { routes } from './app.routes';

export const appConfig: ApplicationConfig = {
    providers: [
        provideRouter(routes)
    ]
};
";

fn codec() -> TsCodec {
    let mut opaque = OpaqueExpressions::new();
    opaque.insert("provideHttpClient()", "provideHttpClient(withInterceptorsFromDi())");
    TsCodec::new(opaque)
}

fn add_http_client(path: &std::path::Path) -> FileStatus {
    let mut file = SourceFile::open(path).unwrap();
    splice::add_import(
        &mut file,
        &["provideHttpClient", "withInterceptorsFromDi"],
        "@angular/common/http",
    )
    .unwrap();
    splice::add_array_item(&mut file, "providers: [", &"provideHttpClient()".into(), &codec())
        .unwrap();
    file.save().unwrap()
}

#[test]
fn test_provider_added_once() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("app.config.ts");
    fs::write(&path, APP_CONFIG).unwrap();

    assert_eq!(add_http_client(&path), FileStatus::Updated);
    assert_eq!(add_http_client(&path), FileStatus::Unchanged);

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(
        content,
        "\
import { ApplicationConfig } from '@angular/core';
import { provideRouter } from '@angular/router';

import { routes } from './app.routes';
import { provideHttpClient, withInterceptorsFromDi } from '@angular/common/http';

export const appConfig: ApplicationConfig = {
    providers: [
        provideRouter(routes),
        provideHttpClient(withInterceptorsFromDi())
    ]
};
"
    );
}

#[test]
fn test_lazy_route_round_trip() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("app.routes.ts");
    fs::write(
        &path,
        "import { Routes } from '@angular/router';\n\nexport const routes: Routes = [];\n",
    )
    .unwrap();

    let route = TsValue::Object(vec![
        ("path".to_string(), "admin".into()),
        (
            "loadChildren".to_string(),
            TsValue::lazy_import("./admin/admin.routes", "ADMIN_ROUTES"),
        ),
    ]);
    let codec = TsCodec::default();

    let mut file = SourceFile::open(&path).unwrap();
    assert!(splice::add_array_item(&mut file, "routes: Routes = [", &route, &codec).unwrap());
    assert_eq!(file.save().unwrap(), FileStatus::Updated);

    let reopened = SourceFile::open(&path).unwrap();
    let segment = monux_tsedit::find_bracketed_region(reopened.lines(), "routes: Routes = [").unwrap();
    assert_eq!(codec.parse(&segment.content), TsValue::Array(vec![route]));
}

#[test]
fn test_missing_file_is_reported() {
    let temp = TempDir::new().unwrap();
    let err = SourceFile::open(temp.path().join("missing.ts")).unwrap_err();
    let err: monux_tsedit::Error = err.into();
    assert!(err.to_string().contains("missing.ts"));
}
