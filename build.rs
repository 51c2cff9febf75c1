fn main() {
  // GDAL is found through pkg-config by gdal-sys elsewhere; Windows builds go through vcpkg.
  let target = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
  if target == "windows" {
    if let Err(err) = vcpkg::Config::new().find_package("gdal") {
      println!("cargo:warning=vcpkg could not locate gdal: {}", err);
    }
  }
}
