// This file is part of the terraform-provider-chef project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use tf_provider::serve;

use crate::chef_provider::ChefProvider;

mod api;
mod chef_provider;
mod config;
mod data_sources;
mod lifecycle;
mod mapper;
mod models;
mod resources;
mod utils;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    serve("chef", ChefProvider::default()).await
}
