pub mod osm_collect;
